//! Chat message types and summarization eligibility.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum message length (in characters) eligible for summarization.
pub const MIN_CHARS_FOR_SUMMARY: usize = 150;

/// Author of a conversational turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Language detection result attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedLanguage {
    /// BCP-47 primary language subtag (e.g. `"en"`).
    pub language: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

/// One conversational turn or derived artifact (translation, summary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Opaque unique id (epoch millis + random suffix).
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Creation time in epoch milliseconds; chronological ordering key.
    pub timestamp: i64,
    /// Detection metadata, present when detection succeeded at send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<DetectedLanguage>,
    /// Back-reference to the message this one was derived from.
    ///
    /// Set on translations and summaries; originals are never mutated
    /// after persistence — derived messages are created instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
}

impl ChatMessage {
    /// Create a user message with optional detection metadata.
    pub fn user(content: impl Into<String>, detected: Option<DetectedLanguage>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: content.into(),
            timestamp: now_epoch_millis(),
            detected,
            origin_id: None,
        }
    }

    /// Create a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: now_epoch_millis(),
            detected: None,
            origin_id: None,
        }
    }

    /// Create an assistant message derived from another message.
    pub fn derived(content: impl Into<String>, origin_id: impl Into<String>) -> Self {
        Self {
            origin_id: Some(origin_id.into()),
            ..Self::assistant(content)
        }
    }

    /// Detected language code, if any.
    pub fn detected_language(&self) -> Option<&str> {
        self.detected.as_ref().map(|d| d.language.as_str())
    }
}

/// Generate a message id: epoch millis plus a random alphanumeric suffix.
///
/// Uniqueness is probabilistic; collision probability is negligible for
/// a single user's chat history.
pub fn new_message_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(7)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}-{suffix}", now_epoch_millis())
}

/// Current time in epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether a message qualifies for the summarize affordance.
///
/// Only user-authored, English-detected messages of at least
/// [`MIN_CHARS_FOR_SUMMARY`] characters qualify.
pub fn can_summarize(message: &ChatMessage) -> bool {
    message.role == Role::User
        && message.detected_language() == Some("en")
        && message.content.chars().count() >= MIN_CHARS_FOR_SUMMARY
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn user_msg(len: usize, lang: &str) -> ChatMessage {
        ChatMessage::user(
            "x".repeat(len),
            Some(DetectedLanguage {
                language: lang.to_owned(),
                confidence: 0.9,
            }),
        )
    }

    #[test]
    fn id_has_timestamp_and_suffix() {
        let id = new_message_id();
        let (ts, suffix) = id.split_once('-').expect("dash separator");
        assert!(ts.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_are_distinct() {
        let a = new_message_id();
        let b = new_message_id();
        assert_ne!(a, b);
    }

    #[test]
    fn summarize_eligibility_length_boundary() {
        assert!(!can_summarize(&user_msg(149, "en")));
        assert!(can_summarize(&user_msg(150, "en")));
    }

    #[test]
    fn summarize_requires_english() {
        assert!(!can_summarize(&user_msg(150, "fr")));
        assert!(!can_summarize(&user_msg(500, "fr")));
    }

    #[test]
    fn summarize_requires_user_role_and_detection() {
        let assistant = ChatMessage::assistant("y".repeat(200));
        assert!(!can_summarize(&assistant));

        let undetected = ChatMessage::user("y".repeat(200), None);
        assert!(!can_summarize(&undetected));
    }

    #[test]
    fn derived_carries_origin() {
        let original = ChatMessage::user("hello", None);
        let derived = ChatMessage::derived("Summary:\nhi", original.id.clone());
        assert_eq!(derived.origin_id.as_deref(), Some(original.id.as_str()));
        assert_eq!(derived.role, Role::Assistant);
    }
}
