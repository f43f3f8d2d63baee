//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every struct is `#[serde(default)]`, so a settings file only needs to name
//! the values it overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Restart delays (milliseconds) for the recognition loop, one per outcome
/// class, in increasing order of severity.
///
/// The values are defaults, not tuned constants; `RetryPolicy::from_config`
/// clamps and orders them before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// After a results callback (matched or not).
    pub after_results_ms: u64,
    /// After the provider reported "no match".
    pub no_match_ms: u64,
    /// After silence / speech timeout.
    pub no_speech_ms: u64,
    /// After any other provider error.
    pub provider_error_ms: u64,
    /// After the provider could not be created or started.
    pub init_failure_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            after_results_ms: 100,
            no_match_ms: 300,
            no_speech_ms: 500,
            provider_error_ms: 1000,
            init_failure_ms: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Settings handed to every recognition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// BCP-47 language tag, or `"system"` for the provider default.
    pub language: String,
    /// Ask the provider to avoid network recognition when it can.
    pub prefer_offline: bool,
    /// Maximum number of candidate transcripts per result.
    pub max_results: u32,
    /// Ask the provider for partial results while the user is speaking.
    pub partial_results: bool,
    /// A session with no terminal callback after this long is restarted.
    pub session_timeout_ms: u64,
    /// Restart delays.
    pub retry: RetryConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "system".into(),
            prefer_offline: true,
            max_results: 1,
            partial_results: true,
            session_timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// CommandConfig
// ---------------------------------------------------------------------------

/// The spoken vocabulary, in match priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Phrases matched case-insensitively as substrings of the transcript.
    /// The first phrase found wins.
    pub vocabulary: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            vocabulary: vec![
                "take a photo".into(),
                "take photo".into(),
                "zoom".into(),
                "zoom in".into(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for the capture pipeline and the zoom choreography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Where photos are written.  `None` means [`AppPaths::photos_dir`].
    pub output_dir: Option<PathBuf>,
    /// File name prefix (`IMG` → `IMG_20250101_120000.jpg`).
    pub file_prefix: String,
    /// Linear zoom (0.0 – 1.0) applied by zoom commands.
    pub zoom_level: f32,
    /// Time allowed for the zoom to settle before the shutter fires.
    pub zoom_settle_ms: u64,
    /// Upper bound on the wait for a location fix before capturing.
    pub location_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_prefix: "IMG".into(),
            zoom_level: 0.5,
            zoom_settle_ms: 500,
            location_timeout_ms: 3000,
        }
    }
}

impl CaptureConfig {
    /// The configured output directory, or the platform pictures directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().photos_dir)
    }

    pub fn zoom_settle(&self) -> Duration {
        Duration::from_millis(self.zoom_settle_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// LocationConfig
// ---------------------------------------------------------------------------

/// A fixed coordinate, used by the demo location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres.
    #[serde(default = "default_accuracy")]
    pub accuracy: f32,
}

fn default_accuracy() -> f32 {
    10.0
}

/// Settings for the location resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Internal timeout of the single fresh-fix request.
    pub fresh_fix_timeout_ms: u64,
    /// Last-known fixes older than this are ignored.
    pub max_fix_age_secs: u64,
    /// Coordinate reported by the demo provider; `None` = no location.
    pub fixed: Option<FixedLocation>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fresh_fix_timeout_ms: 2000,
            max_fix_age_secs: 120,
            fixed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// OverlayConfig
// ---------------------------------------------------------------------------

/// Appearance of the burned-in coordinate overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// JPEG quality (1 – 100) used when re-encoding the enriched photo.
    pub jpeg_quality: u8,
    /// Distance in pixels from the left and bottom edges.
    pub margin_px: u32,
    /// Pixels per font cell.  `None` scales with the image height.
    pub text_scale: Option<u32>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            margin_px: 20,
            text_scale: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_capture::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Speech recognition session settings.
    pub recognition: RecognitionConfig,
    /// Spoken vocabulary.
    pub commands: CommandConfig,
    /// Capture pipeline settings.
    pub capture: CaptureConfig,
    /// Location resolver settings.
    pub location: LocationConfig,
    /// Overlay / re-encode settings.
    pub overlay: OverlayConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.recognition.retry.after_results_ms, 100);
        assert_eq!(cfg.recognition.retry.no_match_ms, 300);
        assert_eq!(cfg.recognition.retry.no_speech_ms, 500);
        assert_eq!(cfg.recognition.retry.provider_error_ms, 1000);
        assert_eq!(cfg.recognition.retry.init_failure_ms, 2000);
        assert_eq!(cfg.recognition.max_results, 1);
        assert!(cfg.recognition.prefer_offline);
        assert_eq!(
            cfg.commands.vocabulary,
            vec!["take a photo", "take photo", "zoom", "zoom in"]
        );
        assert_eq!(cfg.capture.zoom_settle(), Duration::from_millis(500));
        assert!((cfg.capture.zoom_level - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.capture.file_prefix, "IMG");
        assert_eq!(cfg.overlay.jpeg_quality, 95);
        assert!(cfg.location.fixed.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[capture]\nzoom_settle_ms = 750\n\n[location.fixed]\nlatitude = 12.5\nlongitude = -3.25\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.capture.zoom_settle_ms, 750);
        assert_eq!(cfg.capture.file_prefix, "IMG");
        let fixed = cfg.location.fixed.expect("fixed location");
        assert!((fixed.latitude - 12.5).abs() < f64::EPSILON);
        assert!((fixed.accuracy - 10.0).abs() < f32::EPSILON);
        assert_eq!(cfg.recognition, RecognitionConfig::default());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.recognition.language = "en-GB".into();
        cfg.recognition.retry.provider_error_ms = 1500;
        cfg.commands.vocabulary = vec!["cheese".into()];
        cfg.capture.output_dir = Some(dir.path().join("photos"));
        cfg.location.fixed = Some(FixedLocation {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 3.0,
        });
        cfg.overlay.text_scale = Some(4);

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
        assert_eq!(loaded.capture.resolved_output_dir(), dir.path().join("photos"));
    }
}
