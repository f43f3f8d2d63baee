//! Test doubles shared by the unit tests.
//!
//! Every double records what it was asked to do (with `tokio::time::Instant`
//! stamps, so paused-clock tests can assert on delays) and is `Clone`, with
//! clones sharing the same record.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::capture::{CaptureError, CaptureProvider};
use crate::location::{FixPriority, LocationFix, LocationProvider};
use crate::recognition::{
    ListenOptions, RecognitionError, RecognitionErrorCode, Recognizer, RecognizerFactory,
    SessionEvents,
};
use crate::status::StatusSink;

// ---------------------------------------------------------------------------
// Scripted recogniser
// ---------------------------------------------------------------------------

/// What one scripted session does.  Once the script runs out, sessions
/// report `ready` and then stay quiet.
#[derive(Debug, Clone)]
pub enum Script {
    /// `ready`, then the given error.
    Error(RecognitionErrorCode),
    /// `ready`, then these candidates.
    Results(Vec<&'static str>),
    /// `ready`, then silence.
    Silence,
    /// `ready`, `error(Audio)`; destroying the session then emits a
    /// matching result under the dead session's id.
    ErrorThenStaleResults,
    /// `create` fails.
    FailCreate,
    /// `create` succeeds, `start` fails.
    FailStart,
    /// Nothing at all, not even `ready`.
    Unresponsive,
}

#[derive(Debug, Default, Clone)]
pub struct ScriptLog {
    pub created: usize,
    pub destroyed: usize,
    /// Number of undestroyed recognisers at each successful `create`.
    pub live_at_create: Vec<usize>,
    pub max_live: usize,
    /// Every `start` call, failed ones included.
    pub starts: Vec<Instant>,
    /// Every `create` call, failed ones included.
    pub create_attempts: Vec<Instant>,
}

#[derive(Clone)]
pub struct ScriptedRecognizerFactory {
    script: Arc<Mutex<VecDeque<Script>>>,
    log: Arc<Mutex<ScriptLog>>,
}

impl ScriptedRecognizerFactory {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            log: Arc::new(Mutex::new(ScriptLog::default())),
        }
    }

    pub fn log(&self) -> ScriptLog {
        self.log.lock().unwrap().clone()
    }
}

impl RecognizerFactory for ScriptedRecognizerFactory {
    fn create(&self) -> Result<Box<dyn Recognizer>, RecognitionError> {
        let step = self.script.lock().unwrap().pop_front();
        let mut log = self.log.lock().unwrap();
        log.create_attempts.push(Instant::now());

        if matches!(step, Some(Script::FailCreate)) {
            return Err(RecognitionError::Unavailable("scripted".into()));
        }

        let live = log.created - log.destroyed;
        log.live_at_create.push(live);
        log.created += 1;
        log.max_live = log.max_live.max(live + 1);

        Ok(Box::new(ScriptedRecognizer {
            step,
            log: Arc::clone(&self.log),
            events: None,
            destroyed: false,
        }))
    }
}

struct ScriptedRecognizer {
    step: Option<Script>,
    log: Arc<Mutex<ScriptLog>>,
    events: Option<SessionEvents>,
    destroyed: bool,
}

impl Recognizer for ScriptedRecognizer {
    fn start(&mut self, _: &ListenOptions, events: SessionEvents) -> Result<(), RecognitionError> {
        self.log.lock().unwrap().starts.push(Instant::now());

        match &self.step {
            Some(Script::FailStart) => return Err(RecognitionError::Start("scripted".into())),
            Some(Script::Unresponsive) => {}
            Some(Script::Error(code)) => {
                events.ready();
                events.error(*code);
            }
            Some(Script::Results(candidates)) => {
                events.ready();
                events.results(candidates.iter().map(|c| c.to_string()).collect());
            }
            Some(Script::Silence) => {
                events.ready();
                events.silence();
            }
            Some(Script::ErrorThenStaleResults) => {
                events.ready();
                events.error(RecognitionErrorCode::Audio);
            }
            Some(Script::FailCreate) | None => events.ready(),
        }
        self.events = Some(events);
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.log.lock().unwrap().destroyed += 1;

        if let (Some(Script::ErrorThenStaleResults), Some(events)) = (&self.step, &self.events) {
            events.results(vec!["take a photo".into()]);
        }
    }
}

// ---------------------------------------------------------------------------
// Fake camera
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    Initialize,
    Zoom(f32),
    Capture(PathBuf),
}

#[derive(Default)]
struct CameraState {
    calls: Vec<(Instant, CameraCall)>,
    init_failures_left: u32,
    fail_capture: bool,
    fail_zoom: bool,
    capture_delay: Duration,
}

/// Camera double that writes a flat grey JPEG for every capture.
#[derive(Clone, Default)]
pub struct FakeCamera {
    state: Arc<Mutex<CameraState>>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init(self, times: u32) -> Self {
        self.state.lock().unwrap().init_failures_left = times;
        self
    }

    pub fn failing_capture(self) -> Self {
        self.state.lock().unwrap().fail_capture = true;
        self
    }

    pub fn failing_zoom(self) -> Self {
        self.state.lock().unwrap().fail_zoom = true;
        self
    }

    pub fn with_capture_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().capture_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<CameraCall> {
        self.state.lock().unwrap().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, CameraCall)> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: CameraCall) {
        self.state.lock().unwrap().calls.push((Instant::now(), call));
    }
}

#[async_trait]
impl CaptureProvider for FakeCamera {
    async fn initialize(&self) -> Result<(), CaptureError> {
        self.record(CameraCall::Initialize);
        let mut state = self.state.lock().unwrap();
        if state.init_failures_left > 0 {
            state.init_failures_left -= 1;
            return Err(CaptureError::Init("no camera".into()));
        }
        Ok(())
    }

    async fn capture(
        &self,
        destination: &Path,
        _location: Option<LocationFix>,
    ) -> Result<PathBuf, CaptureError> {
        self.record(CameraCall::Capture(destination.to_path_buf()));
        let (delay, fail) = {
            let state = self.state.lock().unwrap();
            (state.capture_delay, state.fail_capture)
        };
        tokio::time::sleep(delay).await;
        if fail {
            return Err(CaptureError::Failed("sensor error".into()));
        }
        write_test_jpeg(destination, 320, 240);
        Ok(destination.to_path_buf())
    }

    async fn set_zoom(&self, level: f32) -> Result<(), CaptureError> {
        self.record(CameraCall::Zoom(level));
        if self.state.lock().unwrap().fail_zoom {
            return Err(CaptureError::Zoom("unsupported".into()));
        }
        Ok(())
    }
}

/// Write a flat grey JPEG.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([100, 100, 100]));
    img.save_with_format(path, image::ImageFormat::Jpeg)
        .expect("write test jpeg");
}

// ---------------------------------------------------------------------------
// Fake location
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeLocation {
    cached: Option<LocationFix>,
    fresh: Option<(LocationFix, Duration)>,
    fresh_requests: Arc<AtomicUsize>,
}

impl FakeLocation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn cached(fix: LocationFix) -> Self {
        Self::default().with_cached(fix)
    }

    /// A provider whose fresh fix arrives after `delay`.
    pub fn fresh(fix: LocationFix, delay: Duration) -> Self {
        Self {
            fresh: Some((fix, delay)),
            ..Self::default()
        }
    }

    pub fn with_cached(mut self, fix: LocationFix) -> Self {
        self.cached = Some(fix);
        self
    }

    pub fn fresh_requests(&self) -> usize {
        self.fresh_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    async fn last_known_fix(&self) -> Option<LocationFix> {
        self.cached
    }

    async fn request_single_fix(&self, _: FixPriority, timeout: Duration) -> Option<LocationFix> {
        self.fresh_requests.fetch_add(1, Ordering::SeqCst);
        let (fix, delay) = self.fresh?;
        if delay > timeout {
            tokio::time::sleep(timeout).await;
            return None;
        }
        tokio::time::sleep(delay).await;
        Some(fix)
    }
}

// ---------------------------------------------------------------------------
// Recording status sink
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingStatus {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingStatus {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l == text)
    }
}

impl StatusSink for RecordingStatus {
    fn publish(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_owned());
    }
}
