use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Longest test anything will generate text for, in seconds
pub const MAX_DURATION_SECS: u32 = 600;

/// Difficulty tier of generated content
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Pro,
    /// User supplied text, no generation
    Custom,
}

/// Kind of content the user types
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Words,
    Sentences,
    Paragraph,
    Numbers,
    Quotes,
    Programming,
}

impl Mode {
    /// Modes built from whole passages picked out of a pool
    pub fn is_passage(&self) -> bool {
        matches!(
            self,
            Mode::Sentences | Mode::Paragraph | Mode::Quotes | Mode::Programming
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

/// Everything the generator needs to produce one prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub language: Language,
    /// Target test length the text should cover
    pub duration_secs: u32,
    pub custom_text: Option<String>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            mode: Mode::default(),
            language: Language::default(),
            duration_secs: 60,
            custom_text: None,
        }
    }
}

impl GenerationRequest {
    pub fn new(difficulty: Difficulty, mode: Mode, language: Language, duration_secs: u32) -> Self {
        Self {
            difficulty,
            mode,
            language,
            duration_secs,
            custom_text: None,
        }
    }

    pub fn with_custom_text(mut self, text: impl Into<String>) -> Self {
        self.custom_text = Some(text.into());
        self
    }

    /// Trimmed custom text, if any is left after trimming
    pub fn trimmed_custom_text(&self) -> Option<&str> {
        self.custom_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// True when this request resolves to the user's own text
    pub fn uses_custom_text(&self) -> bool {
        self.difficulty == Difficulty::Custom && self.trimmed_custom_text().is_some()
    }
}
