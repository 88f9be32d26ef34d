use super::request::Mode;
use crate::error::ContentError;

/// Remote supplier of passages. Transport is up to the implementor; the
/// generator only cares about the text that comes back.
pub trait ContentSource: Send + Sync {
    fn fetch_text(&self, mode: Mode, duration_hint_secs: u32) -> Result<String, ContentError>;
}

impl<F> ContentSource for F
where
    F: Fn(Mode, u32) -> Result<String, ContentError> + Send + Sync,
{
    fn fetch_text(&self, mode: Mode, duration_hint_secs: u32) -> Result<String, ContentError> {
        self(mode, duration_hint_secs)
    }
}

/// Source that always serves the same passage
#[derive(Debug, Clone)]
pub struct FixedSource {
    text: String,
}

impl FixedSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ContentSource for FixedSource {
    fn fetch_text(&self, _mode: Mode, _duration_hint_secs: u32) -> Result<String, ContentError> {
        if self.text.trim().is_empty() {
            Err(ContentError::Empty)
        } else {
            Ok(self.text.clone())
        }
    }
}
