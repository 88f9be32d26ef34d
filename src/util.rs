/// Arithmetic mean, or `None` for an empty sample
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population standard deviation, or `None` for an empty sample
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    let avg = mean(samples)?;
    let variance = samples
        .iter()
        .map(|value| {
            let diff = avg - value;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;

    Some(variance.sqrt())
}

/// `part / whole` as a percentage; zero when `whole` is zero
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Number of characters (not bytes) in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `n` characters of `text`, respecting char boundaries
pub fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
