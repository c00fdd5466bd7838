//! Per-language usage counters.
//!
//! Records how often each language shows up in conversation-action requests
//! and text-classification calls, keyed by `(language_tag, signal_kind)`.
//!
//! ```rust,ignore
//! use language_profile::{FixedLanguageDetector, LanguageProfileUpdater, SqliteSignalStore};
//!
//! let store = Arc::new(SqliteSignalStore::in_memory().await?);
//! let updater = LanguageProfileUpdater::on_current_runtime(store.clone());
//!
//! updater.update_from_classify_text(["en"]).await?;
//! let infos = store.get_all().await?;
//! ```

pub mod analyzer;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dedup;
pub mod detector;
pub mod error;
pub mod signal;
pub mod updater;

pub use analyzer::{LanguageProfileAnalyzer, ProfileReport};
pub use config::Config;
pub use conversation::{ConversationActionsRequest, ConversationMessage};
pub use db::{MemorySignalStore, SignalStore, SqliteSignalStore};
pub use dedup::{DeduplicationKeyExtractor, DEFAULT_NOTIFICATION_KEY, NOTIFICATION_KEY};
pub use detector::{FixedLanguageDetector, LanguageDetector};
pub use error::{DetectionError, ProfileError, StoreError};
pub use signal::{LanguageSignalInfo, SignalKind};
pub use updater::LanguageProfileUpdater;
