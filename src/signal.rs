//! Row model for recorded language signals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of event that produced a language observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Language seen while suggesting conversation actions
    SuggestConversationActions,
    /// Language seen while classifying text
    ClassifyText,
}

impl SignalKind {
    /// All signal kinds, in declaration order.
    pub const ALL: [SignalKind; 2] = [
        SignalKind::SuggestConversationActions,
        SignalKind::ClassifyText,
    ];

    /// Stable name used in storage and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::SuggestConversationActions => "suggest_conversation_actions",
            SignalKind::ClassifyText => "classify_text",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = UnknownSignalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suggest_conversation_actions" => Ok(SignalKind::SuggestConversationActions),
            "classify_text" => Ok(SignalKind::ClassifyText),
            other => Err(UnknownSignalKind(other.to_string())),
        }
    }
}

/// A stored signal kind name that does not match any [`SignalKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal kind: '{0}'")]
pub struct UnknownSignalKind(pub String);

/// How many times a language was observed for one signal kind.
///
/// `(language_tag, signal_kind)` identifies the row; `count` is at least 1
/// once the row exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageSignalInfo {
    /// BCP-47 tag as produced by the detector (e.g. "en", "zh")
    pub language_tag: String,
    pub signal_kind: SignalKind,
    pub count: u64,
}

impl LanguageSignalInfo {
    pub fn new(language_tag: impl Into<String>, signal_kind: SignalKind, count: u64) -> Self {
        Self {
            language_tag: language_tag.into(),
            signal_kind,
            count,
        }
    }
}
