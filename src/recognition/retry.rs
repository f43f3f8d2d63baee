//! Restart delays for the listening loop.
//!
//! There is no retry limit: the loop runs for the life of the process.  What
//! is bounded is each individual delay, from below (no tight failure loop)
//! and from above (prompt recovery once the condition clears).

use std::time::Duration;

use crate::config::RetryConfig;

use super::RecognitionErrorCode;

/// Why a session ended, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RestartCause {
    /// A results callback arrived.
    Results,
    /// The provider heard speech but could not recognise it.
    NoMatch,
    /// Silence, speech timeout, or a session that never finished.
    NoSpeech,
    /// Any other provider error.
    ProviderError,
    /// The recogniser could not be created or started.
    InitFailure,
}

impl RestartCause {
    const ALL: [RestartCause; 5] = [
        RestartCause::Results,
        RestartCause::NoMatch,
        RestartCause::NoSpeech,
        RestartCause::ProviderError,
        RestartCause::InitFailure,
    ];

    pub fn from_error(code: RecognitionErrorCode) -> Self {
        match code {
            RecognitionErrorCode::NoMatch => RestartCause::NoMatch,
            RecognitionErrorCode::SpeechTimeout => RestartCause::NoSpeech,
            _ => RestartCause::ProviderError,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-cause restart delays.
///
/// ```
/// use std::time::Duration;
/// use voice_capture::recognition::{RestartCause, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(RestartCause::Results), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(RestartCause::ProviderError), Duration::from_millis(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: [Duration; 5],
}

impl RetryPolicy {
    /// No restart happens sooner than this.
    pub const MIN_DELAY: Duration = Duration::from_millis(50);
    /// No restart waits longer than this.
    pub const MAX_DELAY: Duration = Duration::from_secs(5);

    /// Build a policy from configured milliseconds.
    ///
    /// Each delay is clamped into [`MIN_DELAY`](Self::MIN_DELAY) ..=
    /// [`MAX_DELAY`](Self::MAX_DELAY), then raised where needed so that a
    /// more severe cause never waits less than a milder one.
    pub fn from_config(config: &RetryConfig) -> Self {
        let configured = [
            config.after_results_ms,
            config.no_match_ms,
            config.no_speech_ms,
            config.provider_error_ms,
            config.init_failure_ms,
        ];

        let mut delays = [Self::MIN_DELAY; 5];
        let mut floor = Self::MIN_DELAY;
        for (i, ms) in configured.into_iter().enumerate() {
            let requested = Duration::from_millis(ms);
            let delay = requested.clamp(Self::MIN_DELAY, Self::MAX_DELAY).max(floor);
            if delay != requested {
                log::warn!(
                    "retry: {:?} delay {ms} ms adjusted to {} ms",
                    RestartCause::ALL[i],
                    delay.as_millis()
                );
            }
            delays[i] = delay;
            floor = delay;
        }

        Self { delays }
    }

    pub fn delay_for(&self, cause: RestartCause) -> Duration {
        self.delays[cause.index()]
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
