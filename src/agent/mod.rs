//! Orchestration: command dispatch and top-level wiring.
//!
//! # Architecture
//!
//! ```text
//! RecognitionLifecycle ──CommandEvent (mpsc)──▶ CommandDispatcher::run()
//!                                                     │ dispatch()
//!                                                     ├─ try_begin (one in flight)
//!                                                     └─ TaskTracker::spawn(capture)
//!                                                            │
//!                                                            ▼
//!                                                     CapturePipeline
//! ```
//!
//! [`Agent`] builds all of the above from an [`AppConfig`] and a set of
//! [`Providers`].
//!
//! [`AppConfig`]: crate::config::AppConfig

pub mod dispatcher;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use runner::{Agent, Providers};
