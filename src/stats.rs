use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters per word in the gross/net WPM convention
pub const CHARS_PER_WORD: f64 = 5.0;

/// Speed and accuracy metrics for a typed text against its reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
    pub correct_chars: usize,
    pub cpm: u32,
    pub gross_wpm: u32,
    pub net_wpm: u32,
}

/// Final outcome of a completed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
    pub cpm: u32,
    pub gross_wpm: u32,
    pub net_wpm: u32,
    /// Seconds the test counted towards its metrics
    pub time_taken: f64,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn from_stats(stats: Stats, time_taken: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            errors: stats.errors,
            cpm: stats.cpm,
            gross_wpm: stats.gross_wpm,
            net_wpm: stats.net_wpm,
            time_taken,
            timestamp,
        }
    }
}

/// Compute metrics for `typed` against `reference` after `elapsed_secs`.
///
/// Positions are compared per Unicode scalar value. Typed characters past the
/// end of the reference count as errors. Elapsed time is floored at one
/// second so the first keystrokes of a test don't produce huge spikes.
pub fn compute_stats(typed: &str, reference: &str, elapsed_secs: f64) -> Stats {
    let typed_len = typed.chars().count();
    if typed_len == 0 {
        return Stats::default();
    }

    let mut expected = reference.chars();
    let errors = typed
        .chars()
        .filter(|&c| expected.next() != Some(c))
        .count();
    let correct_chars = typed_len - errors;

    let accuracy = (correct_chars as f64 / typed_len as f64 * 100.0)
        .round()
        .clamp(0.0, 100.0) as u32;

    let elapsed = if elapsed_secs.is_finite() {
        elapsed_secs.max(0.0)
    } else {
        0.0
    };
    let minutes = elapsed.max(1.0) / 60.0;

    Stats {
        wpm: per_minute(word_count(typed) as f64, minutes),
        accuracy,
        errors,
        correct_chars,
        cpm: per_minute(typed_len as f64, minutes),
        gross_wpm: per_minute(typed_len as f64 / CHARS_PER_WORD, minutes),
        net_wpm: per_minute(correct_chars as f64 / CHARS_PER_WORD, minutes),
    }
}

/// Number of whitespace-delimited, non-empty tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn per_minute(amount: f64, minutes: f64) -> u32 {
    (amount / minutes).round().max(0.0) as u32
}
