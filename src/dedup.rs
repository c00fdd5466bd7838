//! Notification-key extraction for conversation requests.
//!
//! The key groups the messages of one request under the notification they
//! belong to. It lives only for the duration of one ingestion call and is
//! never persisted.

use crate::conversation::ConversationActionsRequest;

/// Extra name under which callers attach the notification key.
pub const NOTIFICATION_KEY: &str = "notification_key";

/// Key used when neither the request nor any message declares one.
pub const DEFAULT_NOTIFICATION_KEY: &str = "default_notification_key";

pub struct DeduplicationKeyExtractor;

impl DeduplicationKeyExtractor {
    /// Effective notification key of a request.
    ///
    /// The request's own extras win over message extras; among messages the
    /// first one declaring a key wins. Blank values are ignored.
    pub fn notification_key(request: &ConversationActionsRequest) -> &str {
        std::iter::once(&request.extras)
            .chain(request.messages.iter().map(|msg| &msg.extras))
            .filter_map(|extras| extras.get(NOTIFICATION_KEY))
            .map(String::as_str)
            .find(|key| !key.trim().is_empty())
            .unwrap_or(DEFAULT_NOTIFICATION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationMessage;

    #[test]
    fn test_default_key_without_extras() {
        let request =
            ConversationActionsRequest::new(vec![ConversationMessage::new("hello world")]);
        assert_eq!(
            DeduplicationKeyExtractor::notification_key(&request),
            DEFAULT_NOTIFICATION_KEY
        );
    }

    #[test]
    fn test_default_key_for_empty_request() {
        let request = ConversationActionsRequest::default();
        assert_eq!(
            DeduplicationKeyExtractor::notification_key(&request),
            DEFAULT_NOTIFICATION_KEY
        );
    }

    #[test]
    fn test_request_extra_used() {
        let request = ConversationActionsRequest::new(vec![ConversationMessage::new("hi")])
            .with_extra(NOTIFICATION_KEY, "test_notification");
        assert_eq!(
            DeduplicationKeyExtractor::notification_key(&request),
            "test_notification"
        );
    }

    #[test]
    fn test_request_extra_wins_over_message_extra() {
        let request = ConversationActionsRequest::new(vec![
            ConversationMessage::new("hi").with_extra(NOTIFICATION_KEY, "from_message")
        ])
        .with_extra(NOTIFICATION_KEY, "from_request");
        assert_eq!(
            DeduplicationKeyExtractor::notification_key(&request),
            "from_request"
        );
    }

    #[test]
    fn test_first_message_key_used() {
        let request = ConversationActionsRequest::new(vec![
            ConversationMessage::new("one"),
            ConversationMessage::new("two").with_extra(NOTIFICATION_KEY, "second"),
            ConversationMessage::new("three").with_extra(NOTIFICATION_KEY, "third"),
        ]);
        assert_eq!(DeduplicationKeyExtractor::notification_key(&request), "second");
    }

    #[test]
    fn test_blank_key_ignored() {
        let request = ConversationActionsRequest::new(vec![
            ConversationMessage::new("one").with_extra(NOTIFICATION_KEY, "  ")
        ]);
        assert_eq!(
            DeduplicationKeyExtractor::notification_key(&request),
            DEFAULT_NOTIFICATION_KEY
        );
    }
}
