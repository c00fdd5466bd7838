use crate::conversation::ConversationActionsRequest;
use crate::db::SignalStore;
use crate::dedup::DeduplicationKeyExtractor;
use crate::detector::LanguageDetector;
use crate::error::ProfileError;
use crate::signal::SignalKind;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Records language usage from conversation-action and classify-text calls.
///
/// Each ingestion call runs as one task on the runtime. The returned future
/// resolves once every increment of the call has been committed, or with the
/// first error. Dropping the future does not cancel the task.
///
/// A call counts each distinct language once, however many of its messages
/// are in that language. Separate calls always count separately.
#[derive(Clone)]
pub struct LanguageProfileUpdater {
    store: Arc<dyn SignalStore>,
    runtime: Handle,
}

impl LanguageProfileUpdater {
    pub fn new(store: Arc<dyn SignalStore>, runtime: Handle) -> Self {
        Self { store, runtime }
    }

    /// Create an updater that spawns onto the runtime it is called from.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn on_current_runtime(store: Arc<dyn SignalStore>) -> Self {
        Self::new(store, Handle::current())
    }

    /// The store the updater writes to.
    pub fn store(&self) -> &Arc<dyn SignalStore> {
        &self.store
    }

    /// Record the languages of a conversation-action request.
    ///
    /// The detector runs once per message with text; the top-ranked tag of
    /// each message counts. Every distinct tag gets one
    /// [`SignalKind::SuggestConversationActions`] increment. All detection
    /// happens before the first write, so a detector error (or a blank top
    /// tag) leaves the store untouched.
    pub fn update_from_conversation_actions<D>(
        &self,
        request: ConversationActionsRequest,
        detector: D,
    ) -> BoxFuture<'static, Result<(), ProfileError>>
    where
        D: LanguageDetector + 'static,
    {
        let store = Arc::clone(&self.store);

        let task = self
            .runtime
            .spawn(record_conversation(store, request, detector));

        join(task, "update_from_conversation_actions")
    }

    /// Record languages already detected by a classify-text call.
    ///
    /// Tags are taken exactly as given. Each distinct tag gets one
    /// [`SignalKind::ClassifyText`] increment. A blank tag fails the call
    /// before anything is written.
    pub fn update_from_classify_text<I, S>(
        &self,
        language_tags: I,
    ) -> BoxFuture<'static, Result<(), ProfileError>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Arc::clone(&self.store);
        let tags: Vec<String> = language_tags.into_iter().map(Into::into).collect();

        let task = self.runtime.spawn(async move {
            let languages = distinct_tags(tags)?;
            increment_each(store.as_ref(), &languages, SignalKind::ClassifyText).await
        });

        join(task, "update_from_classify_text")
    }
}

fn join(
    task: JoinHandle<Result<(), ProfileError>>,
    operation_name: &'static str,
) -> BoxFuture<'static, Result<(), ProfileError>> {
    async move {
        let result = task.await.map_err(ProfileError::from).and_then(|r| r);
        if let Err(e) = &result {
            warn!("{} failed: {}", operation_name, e);
        }
        result
    }
    .boxed()
}

async fn record_conversation<D>(
    store: Arc<dyn SignalStore>,
    request: ConversationActionsRequest,
    detector: D,
) -> Result<(), ProfileError>
where
    D: LanguageDetector,
{
    let notification_key = DeduplicationKeyExtractor::notification_key(&request);
    let languages = detect_languages(&request, &detector)?;

    debug!(
        "Notification '{}': {} message(s), languages {:?}",
        notification_key,
        request.messages.len(),
        languages
    );

    increment_each(
        store.as_ref(),
        &languages,
        SignalKind::SuggestConversationActions,
    )
    .await
}

/// Top-ranked language of every message with text, deduplicated in
/// first-seen order.
fn detect_languages<D>(
    request: &ConversationActionsRequest,
    detector: &D,
) -> Result<Vec<String>, ProfileError>
where
    D: LanguageDetector + ?Sized,
{
    let mut top_tags = Vec::with_capacity(request.messages.len());

    for message in request.messages.iter().filter(|m| m.has_text()) {
        match detector.detect(&message.text)?.into_iter().next() {
            Some(tag) => top_tags.push(tag),
            None => debug!("No language detected for message"),
        }
    }

    distinct_tags(top_tags)
}

/// Deduplicate on the exact tag, keeping first-seen order. Tags are never
/// normalized; a blank tag is an error.
fn distinct_tags(tags: impl IntoIterator<Item = String>) -> Result<Vec<String>, ProfileError> {
    let mut distinct: Vec<String> = Vec::new();
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(ProfileError::InvalidLanguageTag(tag));
        }
        if !distinct.contains(&tag) {
            distinct.push(tag);
        }
    }
    Ok(distinct)
}

// Increments are independent: a failure stops the remaining ones but
// leaves those already committed in place.
async fn increment_each(
    store: &dyn SignalStore,
    languages: &[String],
    signal_kind: SignalKind,
) -> Result<(), ProfileError> {
    for language_tag in languages {
        let count = store.upsert_increment(language_tag, signal_kind, 1).await?;
        debug!("{} ({}) now {}", language_tag, signal_kind, count);
    }
    Ok(())
}
