use super::request::{Difficulty, GenerationRequest, MAX_DURATION_SECS};
use rand::rngs::StdRng;
use rand::Rng;

/// Seconds of typing one number pattern is expected to cover
pub const SECONDS_PER_PATTERN: f64 = 3.0;

/// Pattern shapes per tier, from bare digits up to symbol-laden expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Digit,
    Integer,
    Grouped,
    Decimal,
    Scientific,
    Negative,
    Fraction,
    Currency,
    Hex,
    Percent,
    Color,
    Phone,
}

const EASY: &[Pattern] = &[Pattern::Digit];
const MEDIUM: &[Pattern] = &[Pattern::Digit, Pattern::Integer, Pattern::Grouped];
const HARD: &[Pattern] = &[
    Pattern::Integer,
    Pattern::Decimal,
    Pattern::Scientific,
    Pattern::Negative,
    Pattern::Fraction,
];
const PRO: &[Pattern] = &[
    Pattern::Scientific,
    Pattern::Currency,
    Pattern::Hex,
    Pattern::Percent,
    Pattern::Color,
    Pattern::Phone,
];

/// Patterns needed to fill `duration_secs`
pub fn required_patterns(duration_secs: u32) -> usize {
    let secs = duration_secs.min(MAX_DURATION_SECS);
    ((secs as f64 / SECONDS_PER_PATTERN).ceil() as usize).max(1)
}

pub(super) fn generate(rng: &mut StdRng, request: &GenerationRequest) -> String {
    let pool = match request.difficulty {
        Difficulty::Easy => EASY,
        Difficulty::Medium | Difficulty::Custom => MEDIUM,
        Difficulty::Hard => HARD,
        Difficulty::Pro => PRO,
    };

    (0..required_patterns(request.duration_secs))
        .map(|_| {
            let pattern = pool[rng.gen_range(0..pool.len())];
            render(rng, pattern)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(rng: &mut StdRng, pattern: Pattern) -> String {
    match pattern {
        Pattern::Digit => rng.gen_range(0..10u32).to_string(),
        Pattern::Integer => rng.gen_range(10..10_000u32).to_string(),
        Pattern::Grouped => group_thousands(rng.gen_range(1_000..1_000_000u32)),
        Pattern::Decimal => format!("{}.{:02}", rng.gen_range(0..1000u32), rng.gen_range(0..100u32)),
        Pattern::Scientific => format!(
            "{}.{:02}e{}",
            rng.gen_range(1..10u32),
            rng.gen_range(0..100u32),
            rng.gen_range(-12..=24i32)
        ),
        Pattern::Negative => format!("-{}.{}", rng.gen_range(1..500u32), rng.gen_range(0..10u32)),
        Pattern::Fraction => format!("{}/{}", rng.gen_range(1..10u32), rng.gen_range(2..17u32)),
        Pattern::Currency => format!(
            "${}.{:02}",
            group_thousands(rng.gen_range(1..100_000u32)),
            rng.gen_range(0..100u32)
        ),
        Pattern::Hex => format!("0x{:04X}", rng.gen_range(0..=0xFFFFu32)),
        Pattern::Percent => format!("{}.{}%", rng.gen_range(0..100u32), rng.gen_range(0..10u32)),
        Pattern::Color => format!("#{:06X}", rng.gen_range(0..=0xFF_FFFFu32)),
        Pattern::Phone => format!(
            "+{}-{:03}-{:04}",
            rng.gen_range(1..100u32),
            rng.gen_range(0..1000u32),
            rng.gen_range(0..10_000u32)
        ),
    }
}

/// `1234567` -> `1,234,567`
fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::request::{Language, Mode};
    use rand::SeedableRng;

    fn request(difficulty: Difficulty, duration_secs: u32) -> GenerationRequest {
        GenerationRequest::new(difficulty, Mode::Numbers, Language::English, duration_secs)
    }

    #[test]
    fn pattern_count_follows_duration() {
        assert_eq!(required_patterns(60), 20);
        assert_eq!(required_patterns(10), 4);
        assert_eq!(required_patterns(0), 1);
        assert_eq!(required_patterns(u32::MAX), required_patterns(MAX_DURATION_SECS));

        let mut rng = StdRng::seed_from_u64(1);
        let text = generate(&mut rng, &request(Difficulty::Medium, 30));
        assert_eq!(text.split(' ').count(), 10);
    }

    #[test]
    fn easy_patterns_are_single_digits() {
        let mut rng = StdRng::seed_from_u64(2);
        let text = generate(&mut rng, &request(Difficulty::Easy, 60));
        for token in text.split(' ') {
            assert_eq!(token.len(), 1);
            assert!(token.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn pro_patterns_carry_symbols() {
        let mut rng = StdRng::seed_from_u64(3);
        let text = generate(&mut rng, &request(Difficulty::Pro, 90));
        for token in text.split(' ') {
            assert!(
                token.chars().any(|c| !c.is_ascii_digit()),
                "{token} has no symbols"
            );
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(999_999), "999,999");
    }
}
