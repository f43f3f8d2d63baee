//! Photo capture.
//!
//! * [`CaptureProvider`]: the camera capability (initialise, zoom, shoot).
//! * [`CapturePipeline`]: one-in-flight capture with location tagging,
//!   enrichment and status reporting.
//! * [`naming`]: destination file names.

pub mod naming;
pub mod pipeline;

pub use pipeline::{CapturePipeline, CaptureTicket};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;

use crate::location::LocationFix;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The camera has not finished initialising.
    #[error("camera not ready")]
    NotReady,

    /// Another capture is in flight.
    #[error("capture already in progress")]
    Busy,

    /// The camera could not be initialised.
    #[error("camera initialisation failed: {0}")]
    Init(String),

    /// The camera reported a failure for this capture.
    #[error("capture failed: {0}")]
    Failed(String),

    /// The zoom directive was rejected.
    #[error("zoom failed: {0}")]
    Zoom(String),
}

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// One accepted capture command.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Linear zoom (0.0–1.0) applied before this capture, if any.
    pub zoom_level: Option<f32>,
    /// Return to zoom 0.0 once the capture has finished, success or not.
    pub reset_zoom_after: bool,
    pub requested_at: DateTime<Local>,
}

impl CaptureRequest {
    pub fn plain() -> Self {
        Self {
            zoom_level: None,
            reset_zoom_after: false,
            requested_at: Local::now(),
        }
    }

    pub fn zoomed(level: f32) -> Self {
        Self {
            zoom_level: Some(level.clamp(0.0, 1.0)),
            reset_zoom_after: true,
            requested_at: Local::now(),
        }
    }
}

/// A photo that reached stable storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub path: PathBuf,
    pub location_fix: Option<LocationFix>,
    pub timestamp: DateTime<Local>,
}

impl CaptureResult {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// CaptureProvider
// ---------------------------------------------------------------------------

/// Camera capability.
///
/// Implementations may assume calls never overlap a `capture`: the pipeline
/// serialises captures and issues zoom directives only around them.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Open the camera.  Called until it succeeds.
    async fn initialize(&self) -> Result<(), CaptureError>;

    /// Persist one image at `destination` and return where it was saved.
    ///
    /// `location` is a hint for providers that embed their own metadata.
    /// On failure the provider discards any partial file.
    async fn capture(
        &self,
        destination: &Path,
        location: Option<LocationFix>,
    ) -> Result<PathBuf, CaptureError>;

    /// Set linear zoom, 0.0 (widest) to 1.0 (narrowest).
    async fn set_zoom(&self, level: f32) -> Result<(), CaptureError>;
}
