//! Agent wiring: providers + config → running orchestrator.
//!
//! ```text
//!            ┌──────────────── CancellationToken ────────────────┐
//!            ▼                          ▼                        ▼
//! CapturePipeline::initialize   RecognitionLifecycle::run   CommandDispatcher::run
//!   (camera retry loop)           │  CommandEvent (mpsc, 16)       │
//!                                 └────────────────────────────────┘
//! ```
//!
//! [`Agent::run`] returns once all three have stopped; an in-flight capture
//! (and its enrichment) always completes first.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::capture::{CapturePipeline, CaptureProvider};
use crate::command::{CommandEvent, CommandMatcher};
use crate::config::AppConfig;
use crate::location::LocationProvider;
use crate::recognition::{
    ListenOptions, RecognitionLifecycle, RecognitionState, RecognizerFactory, RetryPolicy,
};
use crate::status::StatusSink;

use super::dispatcher::CommandDispatcher;

const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// The capability providers the agent drives.
#[derive(Clone)]
pub struct Providers {
    pub recognizer: Arc<dyn RecognizerFactory>,
    pub camera: Arc<dyn CaptureProvider>,
    pub location: Arc<dyn LocationProvider>,
    pub status: Arc<dyn StatusSink>,
}

/// A fully wired orchestrator, ready to [`run`](Agent::run).
///
/// ```rust,no_run
/// use tokio_util::sync::CancellationToken;
/// use voice_capture::agent::{Agent, Providers};
/// use voice_capture::config::AppConfig;
///
/// # async fn example(providers: Providers) {
/// let agent = Agent::new(&AppConfig::default(), providers);
/// let cancel = CancellationToken::new();
/// let stopper = cancel.clone();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     stopper.cancel();
/// });
/// agent.run(cancel).await;
/// # }
/// ```
pub struct Agent {
    lifecycle: RecognitionLifecycle,
    dispatcher: CommandDispatcher,
    pipeline: Arc<CapturePipeline>,
    commands: mpsc::Receiver<CommandEvent>,
    init_policy: RetryPolicy,
}

impl Agent {
    pub fn new(config: &AppConfig, providers: Providers) -> Self {
        let Providers {
            recognizer,
            camera,
            location,
            status,
        } = providers;

        let policy = RetryPolicy::from_config(&config.recognition.retry);
        let (command_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let lifecycle = RecognitionLifecycle::new(
            recognizer,
            CommandMatcher::from_config(&config.commands),
            policy.clone(),
            command_tx,
        )
        .with_options(ListenOptions::from_config(&config.recognition))
        .with_session_timeout(config.recognition.session_timeout());

        let pipeline = Arc::new(CapturePipeline::from_config(
            camera,
            location,
            Arc::clone(&status),
            config,
        ));
        let dispatcher = CommandDispatcher::new(Arc::clone(&pipeline), status, &config.capture);

        Self {
            lifecycle,
            dispatcher,
            pipeline,
            commands,
            init_policy: policy,
        }
    }

    /// Hold a keep-awake guard while listening.
    pub fn with_wake_lock(mut self, guard: impl Send + 'static) -> Self {
        self.lifecycle = self.lifecycle.with_wake_lock(guard);
        self
    }

    /// Observe the recognition state.
    pub fn subscribe(&self) -> watch::Receiver<RecognitionState> {
        self.lifecycle.subscribe()
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let Agent {
            lifecycle,
            dispatcher,
            pipeline,
            commands,
            init_policy,
        } = self;

        log::info!("agent: starting");

        let camera_init = {
            let cancel = cancel.clone();
            tokio::spawn(async move { pipeline.initialize(&init_policy, &cancel).await })
        };
        let listening = tokio::spawn(lifecycle.run(cancel.clone()));

        dispatcher.run(commands, cancel.clone()).await;

        if let Err(e) = listening.await {
            log::error!("agent: listening task failed: {e}");
        }
        match camera_init.await {
            Ok(true) => {}
            Ok(false) => log::info!("agent: stopped before the camera was ready"),
            Err(e) => log::error!("agent: camera task failed: {e}"),
        }

        log::info!("agent: stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
