//! Maps recognised speech to a canonical command.
//!
//! Matching is a case-insensitive substring search over an ordered
//! vocabulary: the first phrase contained in the transcript wins, so
//! declaration order is the tie-breaker (`"zoom"` before `"zoom in"` means
//! "zoom in please" yields `zoom`).

use crate::config::CommandConfig;

use super::CanonicalCommand;

/// Ordered, lower-cased vocabulary of command phrases.
///
/// ```
/// use voice_capture::command::CommandMatcher;
///
/// let matcher = CommandMatcher::default();
/// let cmd = matcher.match_text("Please TAKE A PHOTO now").unwrap();
/// assert_eq!(cmd.phrase(), "take a photo");
/// assert!(matcher.match_text("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatcher {
    vocabulary: Vec<CanonicalCommand>,
}

impl CommandMatcher {
    /// Build a matcher from phrases in priority order.
    ///
    /// Phrases are trimmed and lower-cased; blank phrases are dropped since
    /// they would match every transcript.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = phrases
            .into_iter()
            .filter_map(|p| {
                let phrase = p.as_ref().trim().to_lowercase();
                (!phrase.is_empty()).then(|| CanonicalCommand::new(phrase))
            })
            .collect();
        Self { vocabulary }
    }

    pub fn from_config(config: &CommandConfig) -> Self {
        Self::new(&config.vocabulary)
    }

    /// The first vocabulary entry contained in `raw_text`, if any.
    pub fn match_text(&self, raw_text: &str) -> Option<CanonicalCommand> {
        let haystack = raw_text.to_lowercase();
        if haystack.trim().is_empty() {
            return None;
        }
        self.vocabulary
            .iter()
            .find(|cmd| haystack.contains(cmd.phrase()))
            .cloned()
    }

    /// Match an ordered list of recogniser candidates; the first candidate
    /// that contains any phrase wins.  Returns the command with the candidate
    /// text it came from.
    pub fn match_candidates<'a>(
        &self,
        candidates: &'a [String],
    ) -> Option<(CanonicalCommand, &'a str)> {
        candidates
            .iter()
            .find_map(|text| self.match_text(text).map(|cmd| (cmd, text.as_str())))
    }

    /// Phrases in priority order.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(CanonicalCommand::phrase)
    }
}

impl Default for CommandMatcher {
    fn default() -> Self {
        Self::from_config(&CommandConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
