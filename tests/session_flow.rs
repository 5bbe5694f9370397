//! End-to-end session flow tests against the simulated capability host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use glossa::capability::sim::SimulatedHost;
use glossa::capability::null::NullHost;
use glossa::{
    ChatEvent, ChatSession, GlossaConfig, Language, MessageStore, ModelTracker, Role,
};
use std::sync::Arc;
use tokio::sync::mpsc;

fn new_session(
    host: SimulatedHost,
    store: Arc<MessageStore>,
) -> (ChatSession, mpsc::UnboundedReceiver<ChatEvent>) {
    let host = Arc::new(host);
    let tracker = ModelTracker::new(host.clone());
    ChatSession::new(store, tracker, host, GlossaConfig::default())
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ChatEvent>) -> Vec<ChatEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A long English text, comfortably over the summarize threshold.
fn long_english() -> String {
    "The quick brown fox jumps over the lazy dog and then the dog chases \
     the fox around the field for the rest of the afternoon while the \
     farmer watches from the porch and wonders when they will tire."
        .to_owned()
}

#[tokio::test]
async fn send_without_detector_uses_unknown_fallback() {
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let host = Arc::new(NullHost);
    let tracker = ModelTracker::new(host.clone());
    let (mut session, _rx) = ChatSession::new(store.clone(), tracker, host, GlossaConfig::default());
    session.init().await;

    session.send("Hello world").await.expect("send");

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].detected.is_none());
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(
        messages[1].content,
        "I received your message in unknown language."
    );

    // Both turns were persisted.
    let persisted = store.get_all_messages();
    assert_eq!(persisted.len(), 2);
    assert!(persisted[0].detected.is_none());
}

#[tokio::test]
async fn send_with_ready_detector_attaches_metadata() {
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, _rx) = new_session(SimulatedHost::ready(), store.clone());
    session.init().await;

    session
        .send("Hello world, the weather is nice")
        .await
        .expect("send");

    let user = &session.messages()[0];
    let detected = user.detected.as_ref().expect("detected");
    assert_eq!(detected.language, "en");
    assert!(detected.confidence > 0.0 && detected.confidence <= 1.0);

    let ack = &session.messages()[1];
    assert_eq!(ack.content, "I received your message in en language.");
}

#[tokio::test]
async fn translate_creates_persisted_derived_message() {
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, _rx) = new_session(SimulatedHost::ready(), store.clone());
    session.init().await;

    session.send("Hello world, this is the test").await.expect("send");
    let original_id = session.messages()[0].id.clone();

    session
        .translate(&original_id, Language::Spanish)
        .await
        .expect("translate");

    let translation = session.messages().last().expect("translation");
    assert_eq!(translation.role, Role::Assistant);
    assert_eq!(translation.origin_id.as_deref(), Some(original_id.as_str()));
    assert_eq!(
        translation.content,
        "Translation to Spanish:\n[es] Hello world, this is the test"
    );

    // The derived message is reachable through the secondary index.
    let related = store.get_related_messages(&original_id);
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, translation.id);

    // The original was never mutated in the store.
    let persisted_original = store
        .get_all_messages()
        .into_iter()
        .find(|m| m.id == original_id)
        .expect("original");
    assert_eq!(persisted_original.content, "Hello world, this is the test");
}

#[tokio::test]
async fn translate_to_detected_language_is_rejected_before_provider() {
    let host = SimulatedHost::ready();
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, mut rx) = new_session(host.clone(), store.clone());
    session.init().await;

    session.send("Hello world, the weather is nice").await.expect("send");
    let original_id = session.messages()[0].id.clone();
    let before = session.messages().len();
    let persisted_before = store.get_all_messages().len();
    drain(&mut rx);

    session
        .translate(&original_id, Language::English)
        .await
        .expect("translate");

    // No provider call, no new messages, nothing persisted.
    assert_eq!(host.translate_calls(), 0);
    assert_eq!(session.messages().len(), before);
    assert_eq!(store.get_all_messages().len(), persisted_before);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ChatEvent::Notice(n) if n.text.contains("already in English")
    )));
}

#[tokio::test]
async fn summarize_streams_into_placeholder_then_persists() {
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, mut rx) = new_session(SimulatedHost::ready(), store.clone());
    session.init().await;

    session.send(&long_english()).await.expect("send");
    let original_id = session.messages()[0].id.clone();
    drain(&mut rx);

    session.summarize(&original_id).await.expect("summarize");

    // The placeholder received incremental updates, not just a final value.
    let events = drain(&mut rx);
    let updates: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ChatEvent::MessageUpdated { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert!(updates.len() > 1, "expected incremental updates");
    assert!(updates.iter().all(|c| c.starts_with("Summary:\n")));

    let summary = session.messages().last().expect("summary");
    assert_eq!(summary.origin_id.as_deref(), Some(original_id.as_str()));
    assert!(summary.content.starts_with("Summary:\n"));
    assert_eq!(summary.content, *updates.last().expect("last update"));

    // The final accumulated text was persisted.
    let persisted = store.get_related_messages(&original_id);
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].content, summary.content);
}

#[tokio::test]
async fn summarize_failure_before_first_chunk_rolls_back_placeholder() {
    let host = SimulatedHost::ready();
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, mut rx) = new_session(host.clone(), store.clone());
    session.init().await;

    session.send(&long_english()).await.expect("send");
    let original_id = session.messages()[0].id.clone();
    let before = session.messages().len();
    drain(&mut rx);

    host.fail_streaming();
    session.summarize(&original_id).await.expect("summarize");

    // Placeholder is gone from the visible list and nothing was persisted.
    assert_eq!(session.messages().len(), before);
    assert!(
        session
            .messages()
            .iter()
            .all(|m| !m.content.starts_with("Generating summary"))
    );
    assert!(store.get_related_messages(&original_id).is_empty());

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ChatEvent::MessageRemoved { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        ChatEvent::Notice(n) if n.text.contains("Summarization failed")
    )));
}

#[tokio::test]
async fn summary_stream_with_no_chunks_never_persists_placeholder_text() {
    let host = SimulatedHost::ready();
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, _rx) = new_session(host.clone(), store.clone());
    session.init().await;

    session.send(&long_english()).await.expect("send");
    let original_id = session.messages()[0].id.clone();

    host.empty_streaming();
    session.summarize(&original_id).await.expect("summarize");

    // The completed-but-empty summary replaces the placeholder text.
    let summary = session.messages().last().expect("summary");
    assert_eq!(summary.content, "Summary:\n");

    let persisted = store.get_related_messages(&original_id);
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].content, "Summary:\n");
    assert!(!persisted[0].content.contains("Generating summary"));
}

#[tokio::test]
async fn ineligible_message_is_not_summarized() {
    let host = SimulatedHost::ready();
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, _rx) = new_session(host.clone(), store);
    session.init().await;

    session.send("Hello world, too short").await.expect("send");
    let original_id = session.messages()[0].id.clone();
    let before = session.messages().len();

    session.summarize(&original_id).await.expect("summarize");

    assert_eq!(session.messages().len(), before);
    assert_eq!(host.summarize_calls(), 0);
}

#[tokio::test]
async fn history_survives_a_new_session_on_the_same_store() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = Arc::new(MessageStore::open(dir.path()).expect("open"));
        let (mut session, _rx) = new_session(SimulatedHost::ready(), store);
        session.init().await;
        session.send("Hello world, the first run").await.expect("send");
    }

    let store = Arc::new(MessageStore::open(dir.path()).expect("reopen"));
    let (mut session, _rx) = new_session(SimulatedHost::ready(), store);
    session.init().await;

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Hello world, the first run");
    // Chronological order is preserved across the reload.
    assert!(messages[0].timestamp <= messages[1].timestamp);
}

#[tokio::test]
async fn clear_history_empties_store_and_list() {
    let store = Arc::new(MessageStore::in_memory().expect("store"));
    let (mut session, mut rx) = new_session(SimulatedHost::ready(), store.clone());
    session.init().await;

    session.send("Hello world").await.expect("send");
    drain(&mut rx);

    session.clear_history().expect("clear");
    assert!(session.messages().is_empty());
    assert!(store.get_all_messages().is_empty());

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ChatEvent::HistoryCleared)));
}
