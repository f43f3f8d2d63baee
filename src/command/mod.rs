//! Voice command vocabulary and events.
//!
//! * [`CommandMatcher`]: recognised text → [`CanonicalCommand`].
//! * [`CommandEvent`]: a matched command with its source text and time,
//!   handed once to the dispatcher.
//! * [`CommandIntent`]: what the dispatcher should do with a command.

pub mod matcher;

pub use matcher::CommandMatcher;

use chrono::{DateTime, Local};

// ---------------------------------------------------------------------------
// CanonicalCommand
// ---------------------------------------------------------------------------

/// A normalised vocabulary phrase (lower-case, trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalCommand(String);

impl CanonicalCommand {
    pub(crate) fn new(phrase: String) -> Self {
        Self(phrase)
    }

    pub fn phrase(&self) -> &str {
        &self.0
    }

    /// The action this command implies.
    ///
    /// ```
    /// use voice_capture::command::{CommandIntent, CommandMatcher};
    ///
    /// let m = CommandMatcher::default();
    /// assert_eq!(m.match_text("zoom in").unwrap().intent(), CommandIntent::ZoomCapture);
    /// assert_eq!(m.match_text("take photo").unwrap().intent(), CommandIntent::Capture);
    /// ```
    pub fn intent(&self) -> CommandIntent {
        let phrase = self.phrase();
        if phrase.contains("zoom") {
            CommandIntent::ZoomCapture
        } else if ["photo", "picture", "capture"]
            .iter()
            .any(|word| phrase.contains(word))
        {
            CommandIntent::Capture
        } else {
            CommandIntent::Unknown
        }
    }
}

impl std::fmt::Display for CanonicalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a command asks the capture side to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    /// Set zoom, wait for it to settle, capture, reset zoom.
    ZoomCapture,
    /// Capture at the current zoom.
    Capture,
    /// No known action (only reachable with a custom vocabulary).
    Unknown,
}

// ---------------------------------------------------------------------------
// CommandEvent
// ---------------------------------------------------------------------------

/// A matched command, produced by the recognition lifecycle and consumed once
/// by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEvent {
    pub token: CanonicalCommand,
    /// The recogniser candidate the command was found in.
    pub raw_text: String,
    pub observed_at: DateTime<Local>,
}

impl CommandEvent {
    pub fn new(token: CanonicalCommand, raw_text: impl Into<String>) -> Self {
        Self {
            token,
            raw_text: raw_text.into(),
            observed_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents() {
        let cmd = |p: &str| CanonicalCommand::new(p.into());
        assert_eq!(cmd("zoom").intent(), CommandIntent::ZoomCapture);
        assert_eq!(cmd("zoom in").intent(), CommandIntent::ZoomCapture);
        assert_eq!(cmd("take a photo").intent(), CommandIntent::Capture);
        assert_eq!(cmd("take photo").intent(), CommandIntent::Capture);
        assert_eq!(cmd("snap a picture").intent(), CommandIntent::Capture);
        assert_eq!(cmd("cheese").intent(), CommandIntent::Unknown);
    }
}
