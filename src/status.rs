//! User-facing status lines.
//!
//! Every component reports progress through a [`StatusSink`], a
//! fire-and-forget interface: publishing never blocks and never fails the
//! caller.  The texts themselves are centralised in [`StatusEvent`] so the
//! wording stays consistent between the dispatcher and the capture pipeline.

use std::fmt;

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// StatusSink
// ---------------------------------------------------------------------------

/// Receives one-line status updates for display.
///
/// Implementations must return promptly; a UI that needs to do real work
/// should hand the text off to its own thread (see [`ChannelStatusSink`]).
pub trait StatusSink: Send + Sync {
    fn publish(&self, text: &str);
}

/// Writes status lines to the log under target `status`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn publish(&self, text: &str) {
        log::info!(target: "status", "{text}");
    }
}

/// Forwards status lines into an unbounded tokio channel.
///
/// Sending on an unbounded channel never blocks; if the receiver is gone the
/// line is dropped.
#[derive(Debug, Clone)]
pub struct ChannelStatusSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelStatusSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelStatusSink {
    fn publish(&self, text: &str) {
        let _ = self.tx.send(text.to_owned());
    }
}

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// The status lines the orchestrator emits.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// The camera finished initialising.
    CameraReady,
    /// A capture was requested before the camera was initialised.
    CameraNotReady,
    /// A zoom was requested before the camera was initialised.
    CameraNotReadyForZoom,
    /// A command arrived while another capture was in flight.
    CaptureBusy,
    /// Zoom-then-capture choreography has begun.
    ZoomingAndCapturing,
    /// The zoom directive was accepted; `percent` is the linear zoom × 100.
    ZoomSet { percent: f32 },
    /// The zoom directive failed.
    ZoomFailed,
    /// The shutter has been asked to fire.
    Capturing,
    /// The photo is on disk.
    PhotoSaved { file_name: String },
    /// The camera reported a capture failure.
    CaptureFailed,
    /// A command without a known intent.
    Unrecognized { command: String },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::CameraReady => write!(f, "Camera ready"),
            StatusEvent::CameraNotReady => write!(f, "Camera not ready"),
            StatusEvent::CameraNotReadyForZoom => write!(f, "Camera not ready for zoom"),
            StatusEvent::CaptureBusy => write!(f, "Capture already in progress"),
            StatusEvent::ZoomingAndCapturing => write!(f, "Zooming and capturing..."),
            StatusEvent::ZoomSet { percent } => write!(f, "Zoom set to {percent:.0}%"),
            StatusEvent::ZoomFailed => write!(f, "Zoom failed"),
            StatusEvent::Capturing => write!(f, "Capturing..."),
            StatusEvent::PhotoSaved { file_name } => write!(f, "Photo saved: {file_name}"),
            StatusEvent::CaptureFailed => write!(f, "Error taking photo"),
            StatusEvent::Unrecognized { command } => write!(f, "Unrecognized command: {command}"),
        }
    }
}

impl StatusEvent {
    /// Publish this event's text on `sink`.
    pub fn publish_to(&self, sink: &dyn StatusSink) {
        sink.publish(&self.to_string());
    }
}
