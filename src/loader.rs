use crate::corpus::{CorpusGenerator, GenerationRequest, OFFLINE_PASSAGE};
use crate::session::TestSession;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// Typed share of the reference that triggers a routine extension
pub const EXTEND_AT: f64 = 0.5;

/// Typed share of the reference that triggers an emergency extension
pub const EMERGENCY_AT: f64 = 0.9;

/// Why an extension was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    HalfWay,
    Emergency,
}

/// What a progress check decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// Nothing to do
    Idle,
    /// A request went out to a worker; text arrives later
    Requested(Trigger),
    /// Text to append right away
    Ready(String),
}

/// Keeps a running session supplied with text.
///
/// At most one request is in flight; the pending receiver doubles as the
/// in-flight guard. Dropping it on `cancel` discards whatever the worker
/// eventually produces.
#[derive(Debug, Default)]
pub struct ExtensionLoader {
    pending: Option<Receiver<String>>,
    requests_issued: usize,
}

impl ExtensionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests issued since the last `cancel`
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Decide whether the session needs more text and act on it.
    ///
    /// Both thresholds share the guard, so one check never issues more than
    /// one request even when typing has jumped past both at once.
    pub fn check(
        &mut self,
        session: &TestSession,
        request: &GenerationRequest,
        generator: &mut CorpusGenerator,
    ) -> Extension {
        if self.in_flight() || session.reference.is_empty() {
            return Extension::Idle;
        }

        let progress = session.progress();
        let trigger = if progress > EMERGENCY_AT {
            Trigger::Emergency
        } else if progress > EXTEND_AT {
            Trigger::HalfWay
        } else {
            return Extension::Idle;
        };

        if request.uses_custom_text() {
            tracing::debug!(?trigger, "re-appending custom text");
            let custom = request.trimmed_custom_text().unwrap_or_default();
            return Extension::Ready(custom.to_string());
        }

        tracing::debug!(
            ?trigger,
            typed = session.typed_len(),
            reference = session.reference_len(),
            "requesting more text"
        );
        self.spawn(request.clone(), generator.fork());
        Extension::Requested(trigger)
    }

    fn spawn(&mut self, request: GenerationRequest, mut generator: CorpusGenerator) {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let text = generator.generate(&request);
            // receiver gone means the session was reset
            let _ = tx.send(text);
        });
        self.pending = Some(rx);
        self.requests_issued += 1;
    }

    /// Collect a finished request without blocking
    pub fn poll(&mut self) -> Option<String> {
        let outcome = match self.pending.as_ref()?.try_recv() {
            Ok(text) => Ok(text),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(()),
        };
        Some(self.resolve(outcome))
    }

    /// Block up to `timeout` for the pending request
    pub fn wait(&mut self, timeout: Duration) -> Option<String> {
        let outcome = match self.pending.as_ref()?.recv_timeout(timeout) {
            Ok(text) => Ok(text),
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(()),
        };
        Some(self.resolve(outcome))
    }

    /// Forget the pending request; its result will be dropped on arrival
    pub fn cancel(&mut self) {
        self.pending = None;
        self.requests_issued = 0;
    }

    fn resolve(&mut self, outcome: Result<String, ()>) -> String {
        self.pending = None;
        match outcome {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("extension came back empty, appending offline passage");
                OFFLINE_PASSAGE.to_string()
            }
            Err(()) => {
                tracing::warn!("extension worker failed, appending offline passage");
                OFFLINE_PASSAGE.to_string()
            }
        }
    }
}
