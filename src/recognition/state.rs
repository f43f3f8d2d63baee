//! Recognition state machine states and the per-attempt session record.
//!
//! ```text
//! Idle ──start──▶ Starting ──ready──▶ Listening ──results (match)──▶ Matched
//!                    ▲                    │      ──results / silence ─▶ Silent
//!                    │                    │      ──error──────────────▶ Errored
//!                    └──── retry delay ───┴───────────────────────────────┘
//! any state ──shutdown──▶ Stopped
//! ```

use chrono::{DateTime, Local};

use super::SessionId;

// ---------------------------------------------------------------------------
// RecognitionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecognitionState {
    /// Not started yet.
    #[default]
    Idle,
    /// A session was created and asked to start; waiting for `ready`.
    Starting,
    /// The provider is listening.
    Listening,
    /// A command was recognised and dispatched.
    Matched,
    /// The session ended without a command (silence, no match, or results
    /// that contained no vocabulary phrase).
    Silent,
    /// The session failed.
    Errored,
    /// Explicit shutdown; terminal.
    Stopped,
}

impl RecognitionState {
    /// Returns `true` while a provider session exists.
    ///
    /// ```
    /// use voice_capture::recognition::RecognitionState;
    ///
    /// assert!(RecognitionState::Starting.has_session());
    /// assert!(RecognitionState::Listening.has_session());
    /// assert!(!RecognitionState::Silent.has_session());
    /// assert!(!RecognitionState::Stopped.has_session());
    /// ```
    pub fn has_session(&self) -> bool {
        matches!(self, RecognitionState::Starting | RecognitionState::Listening)
    }

    /// Outcome states, each followed by exactly one scheduled restart.
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            RecognitionState::Matched | RecognitionState::Silent | RecognitionState::Errored
        )
    }

    /// A short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RecognitionState::Idle => "Idle",
            RecognitionState::Starting => "Starting",
            RecognitionState::Listening => "Listening",
            RecognitionState::Matched => "Matched",
            RecognitionState::Silent => "Silent",
            RecognitionState::Errored => "Errored",
            RecognitionState::Stopped => "Stopped",
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionSession
// ---------------------------------------------------------------------------

/// Record of one listening attempt.
///
/// Owned by the lifecycle and replaced, never reused, on every restart.
#[derive(Debug, Clone)]
pub struct RecognitionSession {
    pub id: SessionId,
    pub state: RecognitionState,
    pub started_at: DateTime<Local>,
    /// Attempts since the last matched command, this one included.
    pub attempt_count: u32,
}

impl RecognitionSession {
    pub fn new(id: SessionId, attempt_count: u32) -> Self {
        Self {
            id,
            state: RecognitionState::Starting,
            started_at: Local::now(),
            attempt_count,
        }
    }
}
