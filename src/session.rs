use crate::clock::millis_between;
use crate::util::char_len;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Idle,
    /// Armed; the timer starts on the first typed character
    Ready,
    Running,
    Completed,
}

/// The one active exercise
#[derive(Debug, Clone, Default)]
pub struct TestSession {
    pub reference: String,
    pub typed: String,
    pub total_secs: u32,
    /// Seconds counted so far; whole ticks while running, exact once finished
    pub elapsed_secs: f64,
    pub state: LifecycleState,
    /// Clock reading at the first keystroke
    pub started_at: Option<Duration>,
}

impl TestSession {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs: total_secs.max(1),
            ..Self::default()
        }
    }

    pub fn typed_len(&self) -> usize {
        char_len(&self.typed)
    }

    pub fn reference_len(&self) -> usize {
        char_len(&self.reference)
    }

    pub fn remaining_secs(&self) -> f64 {
        (self.total_secs as f64 - self.elapsed_secs).max(0.0)
    }

    /// Share of the reference typed so far
    pub fn progress(&self) -> f64 {
        match self.reference_len() {
            0 => 0.0,
            n => self.typed_len() as f64 / n as f64,
        }
    }

    /// Join more text onto the reference with a single space
    pub fn extend_reference(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.reference.is_empty() {
            self.reference.push(' ');
        }
        self.reference.push_str(text);
    }

    /// Wall-clock seconds since the first keystroke, capped at the configured duration
    pub fn wall_elapsed_secs(&self, now: Duration) -> f64 {
        self.started_at
            .map(|start| millis_between(start, now) as f64 / 1000.0)
            .unwrap_or(0.0)
            .min(self.total_secs as f64)
    }
}

/// One-tick-per-second countdown driven by whatever loop calls `advance`.
///
/// Ticks are derived from clock readings rather than counted calls, so a
/// host polling every 10ms and one polling every 900ms both see exactly one
/// tick per elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: Duration,
    total_secs: u32,
    fired: u32,
}

impl Countdown {
    pub fn new(started_at: Duration, total_secs: u32) -> Self {
        Self {
            started_at,
            total_secs: total_secs.max(1),
            fired: 0,
        }
    }

    /// Number of ticks that became due since the last call
    pub fn advance(&mut self, now: Duration) -> u32 {
        let whole = (millis_between(self.started_at, now) / 1000).min(self.total_secs as u64) as u32;
        let due = whole.saturating_sub(self.fired);
        self.fired += due;
        due
    }

    pub fn is_done(&self) -> bool {
        self.fired >= self.total_secs
    }
}
