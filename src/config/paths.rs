//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voice-capture\
//!   macOS:   ~/Library/Application Support/voice-capture/
//!   Linux:   ~/.config/voice-capture/
//!
//! Photo dir (captured images):
//!   Windows: %USERPROFILE%\Pictures\VoiceCapture\
//!   macOS:   ~/Pictures/VoiceCapture/
//!   Linux:   $XDG_PICTURES_DIR/VoiceCapture/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory captured photos are written to.
    pub photos_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-capture";
    const PHOTOS_DIR_NAME: &'static str = "VoiceCapture";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let photos_dir = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::PHOTOS_DIR_NAME);

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            photos_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
