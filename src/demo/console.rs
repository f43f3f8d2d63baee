//! Console stand-in for a speech recogniser.
//!
//! A dedicated OS thread reads lines from stdin.  Each line is delivered to
//! whichever session is currently listening: a non-blank line becomes the
//! single result candidate, a blank line reports silence.  Lines typed while
//! no session is listening are dropped, the same way speech is lost between
//! real recogniser sessions.  A session that receives nothing ends through
//! the lifecycle's watchdog.

use std::io::BufRead;
use std::sync::{Arc, Mutex};

use crate::recognition::{
    ListenOptions, RecognitionError, Recognizer, RecognizerFactory, SessionEvents,
};

// ---------------------------------------------------------------------------
// ActiveSlot
// ---------------------------------------------------------------------------

/// The session currently waiting for a line, if any.
#[derive(Clone, Default)]
struct ActiveSlot(Arc<Mutex<Option<SessionEvents>>>);

impl ActiveSlot {
    fn listen(&self, events: SessionEvents) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(events);
        }
    }

    fn release(&self, events: &SessionEvents) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.as_ref().map(|e| e.session()) == Some(events.session()) {
                *slot = None;
            }
        }
    }

    /// Hand `line` to the listening session.  Returns `false` if nobody was
    /// listening.
    fn deliver(&self, line: &str) -> bool {
        let events = match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        let Some(events) = events else {
            log::debug!("console: no session listening, dropped {line:?}");
            return false;
        };

        let text = line.trim();
        if text.is_empty() {
            events.silence();
        } else {
            events.beginning_of_speech();
            events.end_of_speech();
            events.results(vec![text.to_owned()]);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// ConsoleRecognizerFactory
// ---------------------------------------------------------------------------

/// Recogniser factory fed by a line-oriented reader (stdin in the binary).
pub struct ConsoleRecognizerFactory {
    slot: ActiveSlot,
    /// Kept so the reader thread is not detached.
    _thread: std::thread::JoinHandle<()>,
}

impl ConsoleRecognizerFactory {
    /// Read lines from stdin.
    pub fn stdin() -> std::io::Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Read lines from `reader` on a dedicated thread.
    pub fn from_reader<R>(reader: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let slot = ActiveSlot::default();
        let thread_slot = slot.clone();

        let thread = std::thread::Builder::new()
            .name("console-recognizer".into())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            thread_slot.deliver(&line);
                        }
                        Err(e) => {
                            log::warn!("console: read failed: {e}");
                            break;
                        }
                    }
                }
                log::info!("console: input closed");
            })?;

        Ok(Self {
            slot,
            _thread: thread,
        })
    }
}

impl RecognizerFactory for ConsoleRecognizerFactory {
    fn create(&self) -> Result<Box<dyn Recognizer>, RecognitionError> {
        Ok(Box::new(ConsoleRecognizer {
            slot: self.slot.clone(),
            events: None,
        }))
    }
}

struct ConsoleRecognizer {
    slot: ActiveSlot,
    events: Option<SessionEvents>,
}

impl Recognizer for ConsoleRecognizer {
    fn start(&mut self, options: &ListenOptions, events: SessionEvents) -> Result<(), RecognitionError> {
        log::debug!(
            "console: session {} listening (language {})",
            events.session(),
            options.language.as_deref().unwrap_or("default")
        );
        events.ready();
        self.slot.listen(events.clone());
        self.events = Some(events);
        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(events) = self.events.take() {
            self.slot.release(&events);
        }
    }
}
