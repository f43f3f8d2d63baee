//! Speech recognition lifecycle.
//!
//! # Architecture
//!
//! ```text
//! RecognizerFactory::create()  ──▶ Box<dyn Recognizer>   (one per session)
//!          │                              │ start(options, SessionEvents)
//!          │                              ▼
//!          │                     provider callback threads
//!          │                              │ SessionEvents::ready/results/…
//!          ▼                              ▼
//! RecognitionLifecycle::run()  ◀── mpsc (session-tagged ProviderEvent)
//!          │
//!          ├─ matched  → CommandEvent → dispatcher channel
//!          └─ terminal → destroy session → RetryPolicy delay → next session
//! ```
//!
//! Providers never call into the lifecycle directly; they post
//! [`ProviderEvent`]s through the [`SessionEvents`] handle they were started
//! with.  Each handle is tagged with its [`SessionId`], so callbacks from a
//! session that has already been destroyed are recognised and dropped.

pub mod lifecycle;
pub mod retry;
pub mod state;

pub use lifecycle::RecognitionLifecycle;
pub use retry::{RestartCause, RetryPolicy};
pub use state::{RecognitionSession, RecognitionState};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::RecognitionConfig;

// ---------------------------------------------------------------------------
// Errors and provider codes
// ---------------------------------------------------------------------------

/// Failure to bring up a recogniser session.
///
/// These are initialisation failures; the lifecycle answers them with the
/// longest restart delay and never gives up.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// The provider could not create a recogniser instance.
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    /// The recogniser refused to start listening.
    #[error("recognizer failed to start: {0}")]
    Start(String),
}

/// Error codes a provider reports through [`SessionEvents::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    /// Speech was heard but nothing intelligible was recognised.
    NoMatch,
    /// No speech before the provider's input timeout.
    SpeechTimeout,
    Network,
    NetworkTimeout,
    Audio,
    Server,
    Client,
    InsufficientPermissions,
    RecognizerBusy,
    /// Provider-specific code with no mapping above.
    Other(i32),
}

// ---------------------------------------------------------------------------
// ListenOptions
// ---------------------------------------------------------------------------

/// Options handed to every [`Recognizer::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    /// BCP-47 tag; `None` means the provider default.
    pub language: Option<String>,
    pub prefer_offline: bool,
    pub max_results: u32,
    pub partial_results: bool,
}

impl ListenOptions {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        let language = match config.language.trim() {
            "" | "system" => None,
            tag => Some(tag.to_owned()),
        };
        Self {
            language,
            prefer_offline: config.prefer_offline,
            max_results: config.max_results.max(1),
            partial_results: config.partial_results,
        }
    }
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self::from_config(&RecognitionConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Creates fresh recogniser sessions.
///
/// A recogniser that errored may refuse reuse, so the lifecycle asks for a
/// new one on every attempt.  Creating and destroying repeatedly must be
/// safe.
pub trait RecognizerFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Recognizer>, RecognitionError>;
}

/// One listening attempt.
///
/// `start` must not block: it arms the recogniser and returns, and results
/// arrive later through `events`.  `destroy` releases every resource the
/// session holds; after it returns the provider must not rely on `events`
/// being observed.
pub trait Recognizer: Send {
    fn start(
        &mut self,
        options: &ListenOptions,
        events: SessionEvents,
    ) -> Result<(), RecognitionError>;

    fn destroy(&mut self);
}

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// Identifies one recogniser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callbacks a recogniser delivers for its session.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// The recogniser is listening.
    Ready,
    /// The user started speaking.
    BeginningOfSpeech,
    /// The user stopped speaking; a terminal callback follows.
    EndOfSpeech,
    /// Final candidates, best first.
    Results(Vec<String>),
    /// Nothing was said.
    Silence,
    /// The session failed.
    Error(RecognitionErrorCode),
}

impl ProviderEvent {
    /// Whether this callback ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderEvent::Results(_) | ProviderEvent::Silence | ProviderEvent::Error(_)
        )
    }
}

#[derive(Debug)]
pub(crate) struct SessionEnvelope {
    pub(crate) session: SessionId,
    pub(crate) event: ProviderEvent,
}

/// Handle a recogniser uses to report callbacks for its session.
///
/// Cheap to clone and safe to use from any thread; every method is
/// non-blocking and silently does nothing once the lifecycle has stopped.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    session: SessionId,
    tx: mpsc::UnboundedSender<SessionEnvelope>,
}

impl SessionEvents {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<SessionEnvelope>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn ready(&self) {
        self.emit(ProviderEvent::Ready);
    }

    pub fn beginning_of_speech(&self) {
        self.emit(ProviderEvent::BeginningOfSpeech);
    }

    pub fn end_of_speech(&self) {
        self.emit(ProviderEvent::EndOfSpeech);
    }

    pub fn results(&self, candidates: Vec<String>) {
        self.emit(ProviderEvent::Results(candidates));
    }

    pub fn silence(&self) {
        self.emit(ProviderEvent::Silence);
    }

    pub fn error(&self, code: RecognitionErrorCode) {
        self.emit(ProviderEvent::Error(code));
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.tx.send(SessionEnvelope {
            session: self.session,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_language_maps_to_provider_default() {
        let mut cfg = RecognitionConfig::default();
        assert_eq!(ListenOptions::from_config(&cfg).language, None);

        cfg.language = "en-GB".into();
        cfg.max_results = 0;
        let opts = ListenOptions::from_config(&cfg);
        assert_eq!(opts.language.as_deref(), Some("en-GB"));
        assert_eq!(opts.max_results, 1);
    }

    #[test]
    fn terminal_events() {
        assert!(!ProviderEvent::Ready.is_terminal());
        assert!(!ProviderEvent::EndOfSpeech.is_terminal());
        assert!(ProviderEvent::Silence.is_terminal());
        assert!(ProviderEvent::Results(vec![]).is_terminal());
        assert!(ProviderEvent::Error(RecognitionErrorCode::Audio).is_terminal());
    }

    #[test]
    fn session_events_are_tagged() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = SessionEvents::new(SessionId(7), tx);
        events.ready();
        events.error(RecognitionErrorCode::NoMatch);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.session, SessionId(7));
        assert_eq!(first.event, ProviderEvent::Ready);
        let second = rx.try_recv().unwrap();
        assert_eq!(
            second.event,
            ProviderEvent::Error(RecognitionErrorCode::NoMatch)
        );
    }

    #[test]
    fn recognizer_is_object_safe() {
        fn _assert(_: Box<dyn Recognizer>, _: std::sync::Arc<dyn RecognizerFactory>) {}
    }
}
