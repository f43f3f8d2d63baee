//! Command dispatcher: turns matched voice commands into capture work.
//!
//! ```text
//! CommandEvent
//!   ├─ ZoomCapture → claim slot → "Zooming and capturing..."
//!   │                 └─▶ task: set_zoom(level) → settle → capture (reset zoom after)
//!   ├─ Capture     → claim slot
//!   │                 └─▶ task: capture
//!   └─ Unknown     → "Unrecognized command: …"
//! ```
//!
//! The capture slot is claimed synchronously inside [`dispatch`], before
//! any zoom directive, so a second command arriving during the zoom settle
//! delay is already rejected as busy.  The work itself runs on a tracked
//! task; [`CommandDispatcher::run`] waits for it before returning.
//!
//! [`dispatch`]: CommandDispatcher::dispatch

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::capture::{CaptureError, CapturePipeline, CaptureRequest};
use crate::command::{CommandEvent, CommandIntent};
use crate::config::CaptureConfig;
use crate::status::{StatusEvent, StatusSink};

/// What [`CommandDispatcher::dispatch`] did with a command.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Capture work was started.
    Started(CommandIntent),
    /// The capture pipeline refused the command.
    Rejected(CaptureError),
    /// The command has no known action.
    Unrecognized,
}

pub struct CommandDispatcher {
    pipeline: Arc<CapturePipeline>,
    status: Arc<dyn StatusSink>,
    zoom_level: f32,
    zoom_settle: Duration,
    tasks: TaskTracker,
}

impl CommandDispatcher {
    pub fn new(
        pipeline: Arc<CapturePipeline>,
        status: Arc<dyn StatusSink>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            pipeline,
            status,
            zoom_level: config.zoom_level.clamp(0.0, 1.0),
            zoom_settle: config.zoom_settle(),
            tasks: TaskTracker::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Dispatch commands until `cancel` fires or the channel closes, then
    /// wait for in-flight captures to finish.
    pub async fn run(self, mut commands: mpsc::Receiver<CommandEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                event = commands.recv() => match event {
                    Some(event) => {
                        self.dispatch(event);
                    }
                    None => {
                        log::info!("dispatch: command channel closed");
                        break;
                    }
                },
            }
        }

        self.wait_idle().await;
        log::info!("dispatch: stopped");
    }

    /// Wait until every capture started so far has completed.
    pub async fn wait_idle(&self) {
        if !self.tasks.is_empty() {
            log::info!("dispatch: waiting for {} capture(s) in flight", self.tasks.len());
        }
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Act on one command.  Never waits for the capture itself.
    pub fn dispatch(&self, event: CommandEvent) -> DispatchOutcome {
        let intent = event.token.intent();
        log::info!("dispatch: {:?} for {:?}", intent, event.raw_text);

        let request = match intent {
            CommandIntent::Unknown => {
                log::warn!("dispatch: no action for {}", event.token);
                StatusEvent::Unrecognized {
                    command: event.token.to_string(),
                }
                .publish_to(self.status.as_ref());
                return DispatchOutcome::Unrecognized;
            }
            CommandIntent::ZoomCapture => CaptureRequest::zoomed(self.zoom_level),
            CommandIntent::Capture => CaptureRequest::plain(),
        };

        let ticket = match self.pipeline.try_begin(&request) {
            Ok(ticket) => ticket,
            Err(e) => return DispatchOutcome::Rejected(e),
        };

        let pipeline = Arc::clone(&self.pipeline);
        match request.zoom_level {
            Some(level) => {
                StatusEvent::ZoomingAndCapturing.publish_to(self.status.as_ref());
                let settle = self.zoom_settle;
                self.tasks.spawn(async move {
                    // A failed zoom still captures, at whatever zoom the camera has.
                    if let Err(e) = pipeline.set_zoom(level).await {
                        log::debug!("dispatch: capturing without zoom ({e})");
                    }
                    tokio::time::sleep(settle).await;
                    if let Err(e) = pipeline.capture_with(ticket, request).await {
                        log::debug!("dispatch: zoom capture ended with {e}");
                    }
                });
            }
            None => {
                self.tasks.spawn(async move {
                    if let Err(e) = pipeline.capture_with(ticket, request).await {
                        log::debug!("dispatch: capture ended with {e}");
                    }
                });
            }
        }

        DispatchOutcome::Started(intent)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
