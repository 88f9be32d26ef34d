use super::data::Corpus;
use super::request::{Difficulty, GenerationRequest, MAX_DURATION_SECS};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::Rng;

/// Minimum number of tokens in a words prompt
pub const WORD_FLOOR: usize = 50;

/// Typing speed used to size a prompt for its duration
pub const ASSUMED_WPM: f64 = 60.0;

/// Share of tokens turned into numbers at the hard tier
pub const HARD_NUMBER_RATIO: f64 = 0.3;

/// Share of tokens turned into code-like fragments at the pro tier
pub const PRO_SYMBOL_RATIO: f64 = 0.4;

/// Wrappers that turn a plain word into a code-like fragment
const CODE_TEMPLATES: &[(&str, &str)] = &[
    ("", "()"),
    ("&", ""),
    ("*", ""),
    ("$", ""),
    ("@", ""),
    ("#", ""),
    ("<", ">"),
    ("[", "]"),
    ("{", "}"),
    ("", "::new"),
    ("", "->next"),
    ("", "[i]"),
    ("", "!="),
    ("", "++"),
    ("", "_id"),
    ("#[", "]"),
    ("--", ""),
    ("", ";"),
    ("\"", "\""),
    ("", "=>"),
];

/// Tokens needed to keep a typist busy for `duration_secs`
pub fn required_words(duration_secs: u32) -> usize {
    let secs = duration_secs.min(MAX_DURATION_SECS);
    let scaled = (secs as f64 / 60.0 * ASSUMED_WPM).ceil() as usize;
    scaled.max(WORD_FLOOR)
}

/// Space separated dictionary tokens, with the tier's replacements applied
pub(super) fn generate(rng: &mut StdRng, corpus: &Corpus, request: &GenerationRequest) -> String {
    let vocabulary = corpus.words(request.language, request.difficulty);
    if vocabulary.is_empty() {
        return String::new();
    }

    let count = required_words(request.duration_secs);
    let mut tokens: Vec<String> = (0..count)
        .filter_map(|_| vocabulary.choose(rng).cloned())
        .collect();

    match request.difficulty {
        Difficulty::Hard => replace_share(rng, &mut tokens, HARD_NUMBER_RATIO, |rng, _| {
            number_token(rng)
        }),
        Difficulty::Pro => replace_share(rng, &mut tokens, PRO_SYMBOL_RATIO, code_fragment),
        _ => {}
    }

    tokens.join(" ")
}

/// Replace exactly `round(len * ratio)` randomly chosen tokens
fn replace_share<F>(rng: &mut StdRng, tokens: &mut [String], ratio: f64, mut make: F)
where
    F: FnMut(&mut StdRng, &str) -> String,
{
    let amount = ((tokens.len() as f64 * ratio).round() as usize).min(tokens.len());
    let picked = index::sample(rng, tokens.len(), amount);
    for idx in picked.into_iter() {
        let replacement = make(rng, &tokens[idx]);
        tokens[idx] = replacement;
    }
}

fn number_token(rng: &mut StdRng) -> String {
    let digits = rng.gen_range(2..=5u32);
    let low = 10u32.pow(digits - 1);
    rng.gen_range(low..low * 10).to_string()
}

fn code_fragment(rng: &mut StdRng, word: &str) -> String {
    match CODE_TEMPLATES.choose(rng) {
        Some((prefix, suffix)) => format!("{prefix}{word}{suffix}"),
        None => format!("{word}()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::request::{Language, Mode};
    use rand::SeedableRng;

    fn request(difficulty: Difficulty, duration_secs: u32) -> GenerationRequest {
        GenerationRequest::new(difficulty, Mode::Words, Language::English, duration_secs)
    }

    #[test]
    fn required_words_respects_floor() {
        assert_eq!(required_words(15), WORD_FLOOR);
        assert_eq!(required_words(60), WORD_FLOOR.max(60));
        assert_eq!(required_words(120), 120);
        assert_eq!(required_words(0), WORD_FLOOR);
        assert_eq!(required_words(u32::MAX), required_words(MAX_DURATION_SECS));
    }

    #[test]
    fn easy_words_come_from_the_dictionary() {
        let mut rng = StdRng::seed_from_u64(7);
        let corpus = Corpus::embedded();
        let text = generate(&mut rng, corpus, &request(Difficulty::Easy, 60));
        let vocabulary = corpus.words(Language::English, Difficulty::Easy);

        let tokens: Vec<&str> = text.split(' ').collect();
        assert_eq!(tokens.len(), required_words(60));
        for token in tokens {
            assert!(vocabulary.iter().any(|w| w == token), "{token} not in dictionary");
        }
    }

    #[test]
    fn hard_tier_replaces_thirty_percent_with_numbers() {
        let mut rng = StdRng::seed_from_u64(11);
        let text = generate(&mut rng, Corpus::embedded(), &request(Difficulty::Hard, 100));
        let tokens: Vec<&str> = text.split(' ').collect();

        let numeric = tokens
            .iter()
            .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
            .count();
        assert_eq!(tokens.len(), 100);
        assert_eq!(numeric, 30);
    }

    #[test]
    fn pro_tier_replaces_forty_percent_with_code_fragments() {
        let mut rng = StdRng::seed_from_u64(13);
        let text = generate(&mut rng, Corpus::embedded(), &request(Difficulty::Pro, 100));
        let tokens: Vec<&str> = text.split(' ').collect();

        let fragments = tokens
            .iter()
            .filter(|t| t.chars().any(|c| c.is_ascii_punctuation()))
            .count();
        assert_eq!(tokens.len(), 100);
        assert_eq!(fragments, 40);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let corpus = Corpus::embedded();
        let a = generate(&mut StdRng::seed_from_u64(3), corpus, &request(Difficulty::Pro, 30));
        let b = generate(&mut StdRng::seed_from_u64(3), corpus, &request(Difficulty::Pro, 30));
        assert_eq!(a, b);
    }

    #[test]
    fn number_tokens_have_two_to_five_digits() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let token = number_token(&mut rng);
            assert!((2..=5).contains(&token.len()), "{token}");
        }
    }
}
