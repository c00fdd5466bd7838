use crate::signal::UnknownSignalKind;
use thiserror::Error;

/// Raised by a language detector that could not process its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("language detection failed: {message}")]
pub struct DetectionError {
    pub message: String,
}

impl DetectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures of the signal store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row for '{language_tag}': {reason}")]
    CorruptRow { language_tag: String, reason: String },

    #[error("increment must be at least 1")]
    ZeroDelta,

    #[error("count for '{language_tag}' ({signal_kind}) would overflow")]
    Overflow {
        language_tag: String,
        signal_kind: String,
    },
}

impl StoreError {
    pub(crate) fn unknown_kind(language_tag: &str, err: UnknownSignalKind) -> Self {
        StoreError::CorruptRow {
            language_tag: language_tag.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Error surfaced by the ingestion futures of
/// [`LanguageProfileUpdater`](crate::updater::LanguageProfileUpdater).
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blank language tag: {0:?}")]
    InvalidLanguageTag(String),

    #[error("ingestion task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_error_display() {
        let err = DetectionError::new("model not loaded");
        assert_eq!(err.to_string(), "language detection failed: model not loaded");
    }

    #[test]
    fn test_profile_error_is_transparent_over_detection() {
        let err: ProfileError = DetectionError::new("boom").into();
        assert_eq!(err.to_string(), "language detection failed: boom");
        assert!(matches!(err, ProfileError::Detection(_)));
    }

    #[test]
    fn test_invalid_language_tag_display_shows_raw_value() {
        let err = ProfileError::InvalidLanguageTag(" \n".to_string());
        assert_eq!(err.to_string(), "blank language tag: \" \\n\"");
    }

    #[test]
    fn test_unknown_kind_maps_to_corrupt_row() {
        let err = StoreError::unknown_kind("en", UnknownSignalKind("bogus".to_string()));
        match err {
            StoreError::CorruptRow {
                language_tag,
                reason,
            } => {
                assert_eq!(language_tag, "en");
                assert!(reason.contains("bogus"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
