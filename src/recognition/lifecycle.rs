//! The listening loop: one recogniser session at a time, restarted forever.
//!
//! [`RecognitionLifecycle::run`] is a single tokio task that owns the active
//! session and reacts to three things:
//!
//! * session-tagged provider callbacks (via [`SessionEvents`]),
//! * the restart timer armed after every terminal outcome,
//! * a watchdog that ends a session which never reports a terminal outcome.
//!
//! # Invariants
//!
//! * At most one session exists.  The previous session is destroyed before
//!   the restart timer is armed, and a new one is created only when that
//!   timer fires.
//! * Every terminal outcome arms the timer exactly once.
//! * Callbacks carrying another session's id are dropped.
//! * Cancelling the token stops the loop: the pending timer is discarded, the
//!   session is destroyed, the wake lock is released, and the state becomes
//!   [`RecognitionState::Stopped`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::command::{CommandEvent, CommandMatcher};

use super::retry::{RestartCause, RetryPolicy};
use super::state::{RecognitionSession, RecognitionState};
use super::{
    ListenOptions, ProviderEvent, Recognizer, RecognizerFactory, SessionEnvelope, SessionEvents,
    SessionId,
};

const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

struct ActiveSession {
    record: RecognitionSession,
    recognizer: Box<dyn Recognizer>,
    deadline: Instant,
}

/// Owns the recognition state machine.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
/// use voice_capture::command::CommandMatcher;
/// use voice_capture::recognition::{RecognitionLifecycle, RecognizerFactory, RetryPolicy};
///
/// # async fn example(factory: Arc<dyn RecognizerFactory>) {
/// let (command_tx, mut command_rx) = mpsc::channel(16);
/// let lifecycle = RecognitionLifecycle::new(
///     factory,
///     CommandMatcher::default(),
///     RetryPolicy::default(),
///     command_tx,
/// );
/// let cancel = CancellationToken::new();
/// tokio::spawn(lifecycle.run(cancel.clone()));
///
/// while let Some(command) = command_rx.recv().await {
///     println!("heard {}", command.token);
/// }
/// # }
/// ```
pub struct RecognitionLifecycle {
    factory: Arc<dyn RecognizerFactory>,
    matcher: CommandMatcher,
    policy: RetryPolicy,
    options: ListenOptions,
    session_timeout: Duration,
    commands: mpsc::Sender<CommandEvent>,
    state: watch::Sender<RecognitionState>,
    wake_lock: Option<Box<dyn Send>>,
    next_session: u64,
    attempts: u32,
    active: Option<ActiveSession>,
}

impl RecognitionLifecycle {
    /// Create a lifecycle in [`RecognitionState::Idle`].
    ///
    /// Matched commands are sent on `commands`.  The send never waits: if
    /// the channel is full the command is dropped with a warning, since a
    /// backlog of stale voice commands is worse than a missed one.
    pub fn new(
        factory: Arc<dyn RecognizerFactory>,
        matcher: CommandMatcher,
        policy: RetryPolicy,
        commands: mpsc::Sender<CommandEvent>,
    ) -> Self {
        let (state, _) = watch::channel(RecognitionState::Idle);
        Self {
            factory,
            matcher,
            policy,
            options: ListenOptions::default(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            commands,
            state,
            wake_lock: None,
            next_session: 0,
            attempts: 0,
            active: None,
        }
    }

    pub fn with_options(mut self, options: ListenOptions) -> Self {
        self.options = options;
        self
    }

    /// Sessions silent for longer than this are treated as a speech timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Hold `guard` until the lifecycle stops.
    ///
    /// Any keep-awake resource whose `Drop` releases it works here.
    pub fn with_wake_lock(mut self, guard: impl Send + 'static) -> Self {
        self.wake_lock = Some(Box::new(guard));
        self
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RecognitionState> {
        self.state.subscribe()
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Listen until `cancel` fires.  The first session starts immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEnvelope>();
        let mut next_start = Some(Instant::now());

        log::info!("lifecycle: listening loop started");

        loop {
            let watchdog = self.active.as_ref().map(|a| a.deadline);

            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                Some(envelope) = event_rx.recv() => {
                    if let Some(cause) = self.on_event(envelope) {
                        next_start = Some(self.finish(cause));
                    }
                }

                () = wait_until(next_start) => {
                    next_start = None;
                    if let Err(cause) = self.start_session(&event_tx) {
                        next_start = Some(self.finish(cause));
                    }
                }

                () = wait_until(watchdog) => {
                    log::warn!(
                        "lifecycle: session produced no outcome within {} ms",
                        self.session_timeout.as_millis()
                    );
                    self.set_state(RecognitionState::Silent);
                    next_start = Some(self.finish(RestartCause::NoSpeech));
                }
            }
        }

        self.stop();
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// `* → Starting`: create and start a fresh recogniser.
    fn start_session(
        &mut self,
        event_tx: &mpsc::UnboundedSender<SessionEnvelope>,
    ) -> Result<(), RestartCause> {
        self.release_session();

        self.next_session += 1;
        let id = SessionId(self.next_session);
        self.attempts = self.attempts.saturating_add(1);
        let record = RecognitionSession::new(id, self.attempts);
        self.state.send_replace(RecognitionState::Starting);

        log::debug!(
            "lifecycle: starting session {id} (attempt {})",
            record.attempt_count
        );

        let mut recognizer = match self.factory.create() {
            Ok(recognizer) => recognizer,
            Err(e) => {
                log::warn!("lifecycle: {e}");
                self.state.send_replace(RecognitionState::Errored);
                return Err(RestartCause::InitFailure);
            }
        };

        if let Err(e) = recognizer.start(&self.options, SessionEvents::new(id, event_tx.clone())) {
            log::warn!("lifecycle: session {id}: {e}");
            recognizer.destroy();
            self.state.send_replace(RecognitionState::Errored);
            return Err(RestartCause::InitFailure);
        }

        self.active = Some(ActiveSession {
            record,
            recognizer,
            deadline: Instant::now() + self.session_timeout,
        });
        Ok(())
    }

    /// Apply one provider callback.  Returns the restart cause when the
    /// callback ended the session.
    fn on_event(&mut self, envelope: SessionEnvelope) -> Option<RestartCause> {
        let SessionEnvelope { session, event } = envelope;

        let current = self.active.as_ref().map(|a| a.record.id);
        if current != Some(session) {
            log::debug!("lifecycle: dropping {event:?} from stale session {session}");
            return None;
        }

        match event {
            ProviderEvent::Ready => {
                log::debug!("lifecycle: session {session} listening");
                self.set_state(RecognitionState::Listening);
                None
            }
            ProviderEvent::BeginningOfSpeech | ProviderEvent::EndOfSpeech => {
                log::trace!("lifecycle: session {session}: {event:?}");
                None
            }
            ProviderEvent::Results(candidates) => {
                match self.matcher.match_candidates(&candidates) {
                    Some((token, raw_text)) => {
                        log::info!("lifecycle: heard {token:?} in {raw_text:?}");
                        let command = CommandEvent::new(token, raw_text);
                        self.set_state(RecognitionState::Matched);
                        self.attempts = 0;
                        self.forward(command);
                    }
                    None => {
                        log::debug!("lifecycle: no command in {candidates:?}");
                        self.set_state(RecognitionState::Silent);
                    }
                }
                Some(RestartCause::Results)
            }
            ProviderEvent::Silence => {
                self.set_state(RecognitionState::Silent);
                Some(RestartCause::NoSpeech)
            }
            ProviderEvent::Error(code) => {
                let cause = RestartCause::from_error(code);
                if cause <= RestartCause::NoSpeech {
                    log::debug!("lifecycle: session {session}: {code:?}");
                    self.set_state(RecognitionState::Silent);
                } else {
                    log::warn!("lifecycle: session {session} failed: {code:?}");
                    self.set_state(RecognitionState::Errored);
                }
                Some(cause)
            }
        }
    }

    /// Release the ended session and return when the next one should start.
    fn finish(&mut self, cause: RestartCause) -> Instant {
        self.release_session();
        let delay = self.policy.delay_for(cause);
        log::debug!(
            "lifecycle: next session in {} ms ({cause:?})",
            delay.as_millis()
        );
        Instant::now() + delay
    }

    /// `* → Stopped`.
    fn stop(&mut self) {
        self.release_session();
        if self.wake_lock.take().is_some() {
            log::debug!("lifecycle: wake lock released");
        }
        self.state.send_replace(RecognitionState::Stopped);
        log::info!("lifecycle: stopped");
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_state(&mut self, state: RecognitionState) {
        if let Some(active) = self.active.as_mut() {
            active.record.state = state;
        }
        self.state.send_replace(state);
    }

    fn release_session(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.recognizer.destroy();
            log::trace!(
                "lifecycle: session {} released after {:?}",
                active.record.id,
                active.record.state
            );
        }
    }

    fn forward(&self, command: CommandEvent) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                log::warn!("lifecycle: dispatcher backlog full, dropping {}", command.token);
            }
            Err(mpsc::error::TrySendError::Closed(command)) => {
                log::warn!("lifecycle: dispatcher gone, dropping {}", command.token);
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::RecognitionErrorCode;
    use crate::testing::{Script, ScriptedRecognizerFactory};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Harness {
        factory: ScriptedRecognizerFactory,
        commands: mpsc::Receiver<CommandEvent>,
        state: watch::Receiver<RecognitionState>,
        cancel: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn(script: Vec<Script>, configure: impl FnOnce(RecognitionLifecycle) -> RecognitionLifecycle) -> Harness {
        let factory = ScriptedRecognizerFactory::new(script);
        let (tx, commands) = mpsc::channel(8);
        let lifecycle = configure(RecognitionLifecycle::new(
            Arc::new(factory.clone()),
            CommandMatcher::default(),
            RetryPolicy::default(),
            tx,
        ));
        let state = lifecycle.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(lifecycle.run(cancel.clone()));
        Harness {
            factory,
            commands,
            state,
            cancel,
            task,
        }
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    impl Harness {
        async fn shutdown(self) -> (ScriptedRecognizerFactory, mpsc::Receiver<CommandEvent>) {
            self.cancel.cancel();
            self.task.await.expect("lifecycle task");
            (self.factory, self.commands)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_timeouts_each_schedule_one_restart() {
        let script = vec![Script::Error(RecognitionErrorCode::SpeechTimeout); 5];
        let h = spawn(script, |l| l);

        settle(5_000).await;
        let (factory, _) = h.shutdown().await;
        let log = factory.log();

        // 5 failed sessions + the one that is listening at shutdown.
        assert_eq!(log.created, 6);
        assert_eq!(log.destroyed, 6);
        assert!(log.live_at_create.iter().all(|live| *live == 0));
        assert_eq!(log.max_live, 1);

        let min = RetryPolicy::default().delay_for(RestartCause::NoSpeech);
        for pair in log.starts.windows(2) {
            assert!(pair[1] - pair[0] >= min, "restart came too early");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn matched_command_is_dispatched_exactly_once() {
        let h = spawn(vec![Script::Results(vec!["please take a photo"])], |l| l);

        settle(1_000).await;
        let (factory, mut commands) = h.shutdown().await;

        let command = commands.try_recv().expect("one command");
        assert_eq!(command.token.phrase(), "take a photo");
        assert_eq!(command.raw_text, "please take a photo");
        assert!(commands.try_recv().is_err());

        let log = factory.log();
        assert_eq!(log.created, 2);
        let gap = log.starts[1] - log.starts[0];
        assert!(gap >= Duration::from_millis(100));
        assert!(gap < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn results_without_command_restart_without_dispatch() {
        let h = spawn(vec![Script::Results(vec!["nice weather"])], |l| l);

        settle(1_000).await;
        let (factory, mut commands) = h.shutdown().await;

        assert!(commands.try_recv().is_err());
        assert_eq!(factory.log().created, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn callbacks_from_destroyed_sessions_are_ignored() {
        let h = spawn(vec![Script::ErrorThenStaleResults], |l| l);

        settle(3_000).await;
        let (factory, mut commands) = h.shutdown().await;

        assert!(commands.try_recv().is_err(), "stale result was dispatched");
        assert_eq!(factory.log().created, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn init_failures_back_off_with_the_longest_delay() {
        let h = spawn(vec![Script::FailCreate, Script::FailStart], |l| l);

        settle(6_000).await;
        let (factory, _) = h.shutdown().await;
        let log = factory.log();

        assert_eq!(log.starts.len(), 2, "only the created recognizers start");
        assert_eq!(log.create_attempts.len(), 3);
        let min = RetryPolicy::default().delay_for(RestartCause::InitFailure);
        for pair in log.create_attempts.windows(2) {
            assert!(pair[1] - pair[0] >= min);
        }
        assert_eq!(log.created, log.destroyed);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_restarts_a_wedged_session() {
        let h = spawn(vec![Script::Unresponsive], |l| {
            l.with_session_timeout(Duration::from_secs(1))
        });

        settle(1_200).await;
        assert_eq!(h.factory.log().created, 1);

        settle(600).await;
        let (factory, _) = h.shutdown().await;
        assert_eq!(factory.log().created, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_moves_to_listening() {
        let h = spawn(vec![], |l| l);
        settle(50).await;
        assert_eq!(*h.state.borrow(), RecognitionState::Listening);
        h.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_everything_and_cancels_pending_restart() {
        struct Guard(Arc<AtomicBool>);
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let guard = Guard(Arc::clone(&released));
        let h = spawn(vec![Script::Error(RecognitionErrorCode::Audio)], |l| {
            l.with_wake_lock(guard)
        });

        // The error arms a 1 s restart; stop before it fires.
        settle(200).await;
        let state = h.state.clone();
        let (factory, _) = h.shutdown().await;

        assert!(released.load(Ordering::SeqCst));
        assert_eq!(*state.borrow(), RecognitionState::Stopped);

        settle(5_000).await;
        let log = factory.log();
        assert_eq!(log.created, 1);
        assert_eq!(log.destroyed, 1);
    }
}
