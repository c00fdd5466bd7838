use crate::error::DetectionError;

/// Detects the languages of a piece of text.
///
/// Returns BCP-47 tags ranked most confident first. An empty list means no
/// language could be determined.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<Vec<String>, DetectionError>;
}

impl<F> LanguageDetector for F
where
    F: Fn(&str) -> Result<Vec<String>, DetectionError> + Send + Sync,
{
    fn detect(&self, text: &str) -> Result<Vec<String>, DetectionError> {
        self(text)
    }
}

/// Detector that reports the same ranking for every input.
#[derive(Debug, Clone)]
pub struct FixedLanguageDetector {
    tags: Vec<String>,
}

impl FixedLanguageDetector {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

impl LanguageDetector for FixedLanguageDetector {
    fn detect(&self, _text: &str) -> Result<Vec<String>, DetectionError> {
        Ok(self.tags.clone())
    }
}
