//! Voice-triggered photo capture agent.
//!
//! The crate is the orchestration layer between three capability providers
//! (speech recogniser, camera, location) and the user:
//!
//! ```text
//! Recognizer callbacks ─▶ RecognitionLifecycle ─▶ CommandMatcher
//!                                │                      │
//!                     (retry / backoff loop)      CommandEvent
//!                                                        ▼
//!                                              CommandDispatcher
//!                                                        │
//!                      LocationResolver ◀── CapturePipeline ──▶ ImageEnricher
//!                                                        │
//!                                                   StatusSink
//! ```
//!
//! See [`agent::Agent`] for the wiring used by the binary.

pub mod agent;
pub mod capture;
pub mod command;
pub mod config;
pub mod demo;
pub mod enrich;
pub mod location;
pub mod recognition;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;
