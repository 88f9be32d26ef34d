pub mod data;
pub mod numbers;
pub mod passages;
pub mod request;
pub mod source;
pub mod words;

// Re-export the main types for convenience
pub use data::Corpus;
pub use request::{Difficulty, GenerationRequest, Language, Mode, MAX_DURATION_SECS};
pub use source::{ContentSource, FixedSource};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Passage served when every other source of text has come up empty
pub const OFFLINE_PASSAGE: &str = "The quick brown fox jumps over the lazy dog. \
Practice makes progress, and steady rhythm beats hurried bursts. \
Keep your eyes on the text and let your fingers find their way home.";

/// Produces prompt text for a generation request.
///
/// Randomness comes from an explicit `StdRng`, so a seeded generator always
/// produces the same sequence of prompts.
pub struct CorpusGenerator {
    rng: StdRng,
    corpus: &'static Corpus,
    source: Option<Arc<dyn ContentSource>>,
}

impl CorpusGenerator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            corpus: Corpus::embedded(),
            source: None,
        }
    }

    /// Use a remote source for passage modes, keeping the offline corpus as fallback
    pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Independent generator seeded from this one's stream, for use on another thread
    pub fn fork(&mut self) -> Self {
        Self {
            rng: StdRng::seed_from_u64(self.rng.gen()),
            corpus: self.corpus,
            source: self.source.clone(),
        }
    }

    /// Generate a prompt. Never returns empty or whitespace-only text.
    pub fn generate(&mut self, request: &GenerationRequest) -> String {
        if request.difficulty == Difficulty::Custom {
            if let Some(text) = request.trimmed_custom_text() {
                return text.to_string();
            }
            tracing::warn!("custom difficulty selected without custom text, generating instead");
            let fallback = GenerationRequest {
                difficulty: Difficulty::Medium,
                custom_text: None,
                ..request.clone()
            };
            return self.generate(&fallback);
        }

        let text = self
            .fetch_remote(request)
            .unwrap_or_else(|| self.generate_local(request));

        if text.trim().is_empty() {
            tracing::warn!(
                mode = %request.mode,
                language = %request.language,
                "generated text was empty, using offline passage"
            );
            return OFFLINE_PASSAGE.to_string();
        }
        text
    }

    fn fetch_remote(&self, request: &GenerationRequest) -> Option<String> {
        let source = self.source.as_ref()?;
        if !request.mode.is_passage() {
            return None;
        }

        match source.fetch_text(request.mode, request.duration_secs) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(mode = %request.mode, "content source returned blank text");
                None
            }
            Err(err) => {
                tracing::warn!(mode = %request.mode, %err, "content source failed, using offline corpus");
                None
            }
        }
    }

    fn generate_local(&mut self, request: &GenerationRequest) -> String {
        match request.mode {
            Mode::Words => words::generate(&mut self.rng, self.corpus, request),
            Mode::Numbers => numbers::generate(&mut self.rng, request),
            Mode::Sentences | Mode::Paragraph | Mode::Quotes | Mode::Programming => {
                passages::generate(&mut self.rng, self.corpus, request)
            }
        }
    }
}

impl Default for CorpusGenerator {
    fn default() -> Self {
        Self::new()
    }
}
