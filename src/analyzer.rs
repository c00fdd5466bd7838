//! Read-side view of the recorded language profile.

use crate::db::SignalStore;
use crate::error::StoreError;
use crate::signal::{LanguageSignalInfo, SignalKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Snapshot of every counter plus the ranked languages per signal kind.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub signals: Vec<LanguageSignalInfo>,
    /// Tags per signal kind, most used first
    pub frequent_languages: BTreeMap<String, Vec<String>>,
}

pub struct LanguageProfileAnalyzer {
    store: Arc<dyn SignalStore>,
}

impl LanguageProfileAnalyzer {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// Language tags of one signal kind ordered by count, highest first.
    /// Equal counts keep the order in which the languages were first seen.
    pub async fn frequent_languages(
        &self,
        signal_kind: SignalKind,
    ) -> Result<Vec<String>, StoreError> {
        let infos = self.store.get_by_kind(signal_kind).await?;
        Ok(rank(infos))
    }

    /// Fraction (0.0 to 1.0) of a kind's observations that were in `language_tag`.
    pub async fn usage_share(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
    ) -> Result<f64, StoreError> {
        let infos = self.store.get_by_kind(signal_kind).await?;
        let total: u64 = infos.iter().map(|info| info.count).sum();
        if total == 0 {
            return Ok(0.0);
        }

        let count = infos
            .iter()
            .find(|info| info.language_tag == language_tag)
            .map_or(0, |info| info.count);

        Ok(count as f64 / total as f64)
    }

    pub async fn report(&self) -> Result<ProfileReport, StoreError> {
        let signals = self.store.get_all().await?;

        let frequent_languages = SignalKind::ALL
            .iter()
            .map(|kind| {
                let of_kind = signals
                    .iter()
                    .filter(|info| info.signal_kind == *kind)
                    .cloned()
                    .collect();
                (kind.to_string(), rank(of_kind))
            })
            .collect();

        Ok(ProfileReport {
            signals,
            frequent_languages,
        })
    }
}

fn rank(mut infos: Vec<LanguageSignalInfo>) -> Vec<String> {
    // Stable sort keeps first-seen order among equal counts
    infos.sort_by(|a, b| b.count.cmp(&a.count));
    infos.into_iter().map(|info| info.language_tag).collect()
}
