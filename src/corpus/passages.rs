use super::data::Corpus;
use super::request::{Difficulty, GenerationRequest, Mode, MAX_DURATION_SECS};
use crate::stats::word_count;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::ops::RangeInclusive;

/// Passages needed to fill `duration_secs` in a passage mode
pub fn required_passages(mode: Mode, duration_secs: u32) -> usize {
    let (per_minute, minimum) = match mode {
        Mode::Sentences => (6.0, 2),
        Mode::Quotes => (3.0, 2),
        Mode::Paragraph => (1.0, 1),
        Mode::Programming => (6.0, 2),
        Mode::Words | Mode::Numbers => (6.0, 2),
    };
    let secs = duration_secs.min(MAX_DURATION_SECS);
    ((secs as f64 / 60.0 * per_minute).ceil() as usize).max(minimum)
}

/// Complexity score a passage is bucketed by: words for prose, symbols for code
pub fn complexity(mode: Mode, passage: &str) -> usize {
    match mode {
        Mode::Programming => passage.chars().filter(char::is_ascii_punctuation).count(),
        _ => word_count(passage),
    }
}

/// Complexity range accepted for a tier in a given mode
pub fn tier_range(mode: Mode, difficulty: Difficulty) -> RangeInclusive<usize> {
    // (easy max, medium max, hard max); pro takes everything above hard
    let (easy, medium, hard) = match mode {
        Mode::Sentences => (8, 14, 22),
        Mode::Quotes => (12, 22, 35),
        Mode::Paragraph => (40, 60, 80),
        Mode::Programming => (4, 8, 14),
        Mode::Words | Mode::Numbers => (usize::MAX, usize::MAX, usize::MAX),
    };
    match difficulty {
        Difficulty::Easy => 0..=easy,
        Difficulty::Medium => easy.saturating_add(1)..=medium,
        Difficulty::Hard => medium.saturating_add(1)..=hard,
        Difficulty::Pro => hard.saturating_add(1)..=usize::MAX,
        Difficulty::Custom => 0..=usize::MAX,
    }
}

/// Filtered, shuffled, duplicated and sliced passages joined with spaces
pub(super) fn generate(rng: &mut StdRng, corpus: &Corpus, request: &GenerationRequest) -> String {
    let pool = corpus.passages(request.mode, request.language);
    let range = tier_range(request.mode, request.difficulty);

    let mut candidates: Vec<&str> = pool
        .iter()
        .map(String::as_str)
        .filter(|passage| range.contains(&complexity(request.mode, passage)))
        .collect();

    if candidates.is_empty() {
        tracing::debug!(
            mode = %request.mode,
            difficulty = %request.difficulty,
            "no passages match tier, using full pool"
        );
        candidates = pool.iter().map(String::as_str).collect();
    }
    if candidates.is_empty() {
        return String::new();
    }

    candidates.shuffle(rng);
    fill(&candidates, required_passages(request.mode, request.duration_secs))
        .into_iter()
        .join(" ")
}

/// Duplicate `items` until there are at least `count`, then slice to `count`
fn fill<'a>(items: &[&'a str], count: usize) -> Vec<&'a str> {
    let mut filled = items.to_vec();
    while filled.len() < count {
        filled.extend_from_slice(items);
    }
    filled.truncate(count);
    filled
}
