use crate::clock::millis_between;
use crate::util::{mean, percent, std_dev};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Inter-key gaps at or above this are pauses, not reaction time
pub const PAUSE_THRESHOLD_MS: u64 = 2000;

/// How often buffered samples are handed to persistence while running
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// A replay is only worth keeping with at least this many entries...
pub const MIN_REPLAY_ENTRIES: usize = 20;

/// ...and for a session at least this long
pub const MIN_REPLAY_SECS: f64 = 20.0;

/// One typed (non-deleted) character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    /// Character the reference expected at `index`
    pub expected: char,
    /// Character that was actually typed
    pub typed: char,
    /// Time since the session started, in milliseconds
    pub timestamp_ms: u64,
    pub index: usize,
    /// Gap since the previous keystroke
    pub latency_ms: u64,
    pub correct: bool,
}

/// Samples buffered between flushes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub events: Vec<KeystrokeEvent>,
}

impl TelemetryBatch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub character: char,
    pub time_ms: u64,
    pub index: usize,
}

/// Timeline of correctly typed characters, used to race a ghost of this run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayTrace {
    pub entries: Vec<ReplayEntry>,
}

impl ReplayTrace {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a trace from a session lasting `session_secs` should be kept
    pub fn worth_saving(&self, session_secs: f64) -> bool {
        self.len() >= MIN_REPLAY_ENTRIES && session_secs >= MIN_REPLAY_SECS
    }
}

/// Captures per-key latency samples and the replay trace for one session
#[derive(Debug, Clone, Default)]
pub struct TelemetryRecorder {
    batch: TelemetryBatch,
    trace: ReplayTrace,
    session_start: Option<Duration>,
    last_keystroke: Option<Duration>,
    last_flush: Option<Duration>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session at clock time `now`; arms the flush schedule
    pub fn begin(&mut self, now: Duration) {
        self.clear();
        self.session_start = Some(now);
        self.last_flush = Some(now);
    }

    /// Record one appended character
    pub fn record(&mut self, now: Duration, index: usize, typed: char, expected: char) {
        self.push(now, index, typed, expected, true);
    }

    /// Record a character that arrived together with others in one input.
    /// It joins the replay trace but yields no latency sample.
    pub fn record_untimed(&mut self, now: Duration, index: usize, typed: char, expected: char) {
        self.push(now, index, typed, expected, false);
    }

    fn push(&mut self, now: Duration, index: usize, typed: char, expected: char, timed: bool) {
        let Some(start) = self.session_start else {
            return;
        };
        let correct = typed == expected;
        let timestamp_ms = millis_between(start, now);

        if let Some(previous) = self.last_keystroke.filter(|_| timed) {
            let latency_ms = millis_between(previous, now);
            if latency_ms < PAUSE_THRESHOLD_MS {
                self.batch.events.push(KeystrokeEvent {
                    expected,
                    typed,
                    timestamp_ms,
                    index,
                    latency_ms,
                    correct,
                });
            }
        }
        self.last_keystroke = Some(now);

        if correct {
            self.trace.entries.push(ReplayEntry {
                character: typed,
                time_ms: timestamp_ms,
                index,
            });
        }
    }

    /// Hand over the buffered batch if the flush interval has passed
    pub fn take_due(&mut self, now: Duration) -> Option<TelemetryBatch> {
        let last = self.last_flush?;
        if now.saturating_sub(last) < FLUSH_INTERVAL {
            return None;
        }
        self.last_flush = Some(now);
        self.take_batch()
    }

    /// Hand over whatever is buffered and stop the flush schedule
    pub fn drain(&mut self) -> Option<TelemetryBatch> {
        self.last_flush = None;
        self.take_batch()
    }

    /// Take the replay trace, leaving an empty one behind
    pub fn take_trace(&mut self) -> ReplayTrace {
        std::mem::take(&mut self.trace)
    }

    pub fn pending(&self) -> &TelemetryBatch {
        &self.batch
    }

    pub fn trace(&self) -> &ReplayTrace {
        &self.trace
    }

    /// Drop all buffers and cancel the flush schedule
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn take_batch(&mut self) -> Option<TelemetryBatch> {
        if self.batch.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.batch))
        }
    }
}

/// Aggregated performance for one expected character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySummary {
    pub character: char,
    pub attempts: usize,
    pub misses: usize,
    pub mean_latency_ms: f64,
    pub latency_std_dev_ms: f64,
    pub miss_rate: f64,
}

impl KeySummary {
    /// Higher means the key needs more practice
    pub fn difficulty_score(&self) -> f64 {
        let timing_penalty = ((self.mean_latency_ms - 200.0) / 100.0).max(0.0);
        self.miss_rate * 2.0 + timing_penalty
    }
}

/// Per-key summaries over a set of events, ordered by character
pub fn summarize_keys(events: &[KeystrokeEvent]) -> Vec<KeySummary> {
    let mut by_key: HashMap<char, Vec<&KeystrokeEvent>> = HashMap::new();
    for event in events {
        by_key.entry(event.expected).or_default().push(event);
    }

    by_key
        .into_iter()
        .sorted_by_key(|(character, _)| *character)
        .map(|(character, samples)| {
            let latencies: Vec<f64> = samples.iter().map(|e| e.latency_ms as f64).collect();
            let misses = samples.iter().filter(|e| !e.correct).count();
            KeySummary {
                character,
                attempts: samples.len(),
                misses,
                mean_latency_ms: mean(&latencies).unwrap_or(0.0),
                latency_std_dev_ms: std_dev(&latencies).unwrap_or(0.0),
                miss_rate: percent(misses, samples.len()),
            }
        })
        .collect()
}

/// The `count` keys most in need of practice, hardest first
pub fn weakest_keys(summaries: &[KeySummary], count: usize) -> Vec<KeySummary> {
    summaries
        .iter()
        .sorted_by(|a, b| {
            b.difficulty_score()
                .partial_cmp(&a.difficulty_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .take(count)
        .cloned()
        .collect()
}
