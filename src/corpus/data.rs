use super::request::{Difficulty, Language, Mode};
use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

static CORPUS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/src/corpus/data");

static EMBEDDED: OnceLock<Corpus> = OnceLock::new();

/// Language used when a language has no pool of its own
const FALLBACK_LANGUAGE: Language = Language::English;

type WordTable = HashMap<String, HashMap<String, Vec<String>>>;
type PassageTable = HashMap<String, Vec<String>>;

/// Static offline corpus: word dictionaries and passage pools
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Corpus {
    words: WordTable,
    sentences: PassageTable,
    quotes: PassageTable,
    paragraphs: PassageTable,
    programming: PassageTable,
}

impl Corpus {
    /// Corpus compiled into the binary, parsed on first use
    pub fn embedded() -> &'static Corpus {
        EMBEDDED.get_or_init(|| Corpus {
            words: read_table("words.json"),
            sentences: read_table("sentences.json"),
            quotes: read_table("quotes.json"),
            paragraphs: read_table("paragraphs.json"),
            programming: read_table("programming.json"),
        })
    }

    /// Dictionary for a language and tier, falling back to English
    pub fn words(&self, language: Language, difficulty: Difficulty) -> &[String] {
        let tier = match difficulty {
            Difficulty::Custom => Difficulty::Medium,
            other => other,
        };
        let lookup = |lang: Language| {
            self.words
                .get(&lang.to_string())
                .and_then(|tiers| tiers.get(&tier.to_string()))
                .filter(|words| !words.is_empty())
        };

        lookup(language)
            .or_else(|| lookup(FALLBACK_LANGUAGE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Full passage pool for a mode and language, falling back to English
    pub fn passages(&self, mode: Mode, language: Language) -> &[String] {
        let table = match mode {
            Mode::Sentences => &self.sentences,
            Mode::Quotes => &self.quotes,
            Mode::Paragraph => &self.paragraphs,
            Mode::Programming => &self.programming,
            Mode::Words | Mode::Numbers => return &[],
        };
        let lookup = |lang: Language| {
            table
                .get(&lang.to_string())
                .filter(|pool| !pool.is_empty())
        };

        lookup(language)
            .or_else(|| lookup(FALLBACK_LANGUAGE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn read_table<T: DeserializeOwned + Default>(file_name: &str) -> T {
    let Some(file) = CORPUS_DIR.get_file(file_name) else {
        tracing::error!(file = file_name, "corpus file missing from embedded data");
        return T::default();
    };
    let Some(contents) = file.contents_utf8() else {
        tracing::error!(file = file_name, "corpus file is not valid UTF-8");
        return T::default();
    };

    serde_json::from_str(contents).unwrap_or_else(|err| {
        tracing::error!(file = file_name, %err, "unable to parse corpus file");
        T::default()
    })
}
