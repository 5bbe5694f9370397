//! Chat session orchestration.
//!
//! `ChatSession` owns the in-memory message list and sequences the
//! user-facing flows — send, translate, summarize — across the model
//! tracker, the capability host, and the message store. UI-facing
//! changes are emitted as [`ChatEvent`]s; rendering lives elsewhere.
//!
//! Everything here is promise-style sequencing on one logical task:
//! every provider and store call is a sequential suspension point, and
//! no cancellation or timeout is modeled.

use crate::capability::{CapabilityHost, CapabilityKind, SummarizerOptions, TranslatorOptions};
use crate::config::GlossaConfig;
use crate::error::Result;
use crate::languages::Language;
use crate::message::{ChatMessage, DetectedLanguage, Role};
use crate::models::ModelTracker;
use crate::notice::Notice;
use crate::store::MessageStore;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Placeholder content shown while a summary streams in.
const SUMMARY_PLACEHOLDER: &str = "Generating summary…";

/// UI-facing session events (the frontend's render feed).
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A message was appended to the visible list.
    MessageAppended(ChatMessage),
    /// An existing message's content changed (streamed summary chunks).
    MessageUpdated { id: String, content: String },
    /// A message was removed from the visible list (rolled-back placeholder).
    MessageRemoved { id: String },
    /// The whole history was cleared.
    HistoryCleared,
    /// Transient user-visible notice (the toast equivalent).
    Notice(Notice),
}

/// Coordinates the model tracker, capability host, and message store
/// with the user-facing chat flows.
pub struct ChatSession {
    store: Arc<MessageStore>,
    tracker: ModelTracker,
    host: Arc<dyn CapabilityHost>,
    config: GlossaConfig,
    messages: Vec<ChatMessage>,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatSession {
    /// Build a session and its event receiver.
    ///
    /// Tracker notices (model download failures) are forwarded onto the
    /// same event channel, so frontends watch a single feed. Must be
    /// called within a tokio runtime.
    pub fn new(
        store: Arc<MessageStore>,
        tracker: ModelTracker,
        host: Arc<dyn CapabilityHost>,
        config: GlossaConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();

        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<Notice>();
        tracker.set_notice_sink(notice_tx);
        let forward = events.clone();
        tokio::spawn(async move {
            while let Some(notice) = notice_rx.recv().await {
                let _ = forward.send(ChatEvent::Notice(notice));
            }
        });

        let session = Self {
            store,
            tracker,
            host,
            config,
            messages: Vec::new(),
            events,
        };
        (session, events_rx)
    }

    /// Check all models and load persisted history.
    pub async fn init(&mut self) {
        self.tracker.initialize_models().await;
        self.messages = self.store.get_all_messages();
    }

    /// Current visible message list, chronological.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn tracker(&self) -> &ModelTracker {
        &self.tracker
    }

    /// Send flow: detect → persist user message → synthesize and persist
    /// the acknowledgment → surface stored derived messages.
    pub async fn send(&mut self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            self.notify(Notice::warn("Cannot send an empty message"));
            return Ok(());
        }

        let detected = self.detect_language(content).await;

        let user_message = ChatMessage::user(content, detected.clone());
        self.persist(&user_message)?;
        self.append(user_message.clone());

        let language = detected
            .map(|d| d.language)
            .unwrap_or_else(|| "unknown".to_owned());
        let ack = ChatMessage::assistant(format!("I received your message in {language} language."));
        self.persist(&ack)?;
        self.append(ack);

        for related in self.store.get_related_messages(&user_message.id) {
            self.append(related);
        }
        Ok(())
    }

    /// Translate flow: creates a derived assistant message carrying the
    /// translated text and a back-reference to the original.
    pub async fn translate(&mut self, message_id: &str, target: Language) -> Result<()> {
        if !self.model_ready(CapabilityKind::Translator) {
            self.notify(Notice::warn("Translation is not available"));
            return Ok(());
        }
        let Some(message) = self.find_message(message_id).cloned() else {
            self.notify(Notice::warn("Message not found"));
            return Ok(());
        };

        let source = message
            .detected_language()
            .unwrap_or(&self.config.translation.default_source)
            .to_owned();
        // Already in the target language: reject before touching the provider.
        if source == target.code() {
            self.notify(Notice::warn(format!(
                "Message is already in {}",
                target.label()
            )));
            return Ok(());
        }

        let translated = async {
            let translator = self
                .host
                .create_translator(TranslatorOptions::new(source, target.code()), None)
                .await?;
            translator.translate(&message.content).await
        }
        .await;

        let translated = match translated {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(message_id, error = %e, "translation failed");
                self.notify(Notice::error("Failed to translate message"));
                return Ok(());
            }
        };

        let derived = ChatMessage::derived(
            format!("Translation to {}:\n{translated}", target.label()),
            message_id,
        );
        self.persist(&derived)?;
        self.append(derived);
        Ok(())
    }

    /// Summarize flow: streams the summary into a transient placeholder
    /// message, persisting only the final accumulated text.
    ///
    /// On any failure — including before the first chunk — the
    /// placeholder is removed and nothing is persisted.
    pub async fn summarize(&mut self, message_id: &str) -> Result<()> {
        if !self.model_ready(CapabilityKind::Summarizer) {
            self.notify(Notice::warn("Summarization is not available"));
            return Ok(());
        }
        let Some(message) = self.find_message(message_id).cloned() else {
            self.notify(Notice::warn("Message not found"));
            return Ok(());
        };
        if !self.summary_eligible(&message) {
            self.notify(Notice::warn("Message is not eligible for summarization"));
            return Ok(());
        }

        let summarizer = match self
            .host
            .create_summarizer(SummarizerOptions::default(), None)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(message_id, error = %e, "summarizer creation failed");
                self.notify(Notice::error("Summarization failed"));
                return Ok(());
            }
        };

        let placeholder = ChatMessage::derived(SUMMARY_PLACEHOLDER, message_id);
        let placeholder_id = placeholder.id.clone();
        self.append(placeholder);

        let mut stream = match summarizer.summarize_streaming(&message.content).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(message_id, error = %e, "summary stream failed to start");
                self.remove(&placeholder_id);
                self.notify(Notice::error("Summarization failed"));
                return Ok(());
            }
        };

        let mut summary = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(delta) => {
                    summary.push_str(&delta);
                    self.update_content(&placeholder_id, format!("Summary:\n{summary}"));
                }
                Err(e) => {
                    tracing::error!(message_id, error = %e, "summarization failed mid-stream");
                    self.remove(&placeholder_id);
                    self.notify(Notice::error("Summarization failed"));
                    return Ok(());
                }
            }
        }

        // A stream may complete without yielding a single chunk; the
        // placeholder text itself must never be persisted.
        if summary.is_empty() {
            self.update_content(&placeholder_id, format!("Summary:\n{summary}"));
        }

        let final_message = match self.find_message(&placeholder_id).cloned() {
            Some(m) => m,
            None => return Ok(()),
        };
        if let Err(e) = self.persist(&final_message) {
            self.remove(&placeholder_id);
            return Err(e);
        }
        Ok(())
    }

    /// Clear the store and the visible list.
    pub fn clear_history(&mut self) -> Result<()> {
        if let Err(e) = self.store.clear_messages() {
            self.notify(Notice::error("Failed to clear messages"));
            return Err(e);
        }
        self.messages.clear();
        self.emit(ChatEvent::HistoryCleared);
        Ok(())
    }

    /// Whether `message` qualifies for the summarize affordance, under
    /// the configured minimum length.
    pub fn summary_eligible(&self, message: &ChatMessage) -> bool {
        message.role == Role::User
            && message.detected_language() == Some("en")
            && message.content.chars().count() >= self.config.summary.min_chars
    }

    /// Detect the input language when the detector is ready; degrade to
    /// `None` (with a warning) otherwise.
    async fn detect_language(&mut self, text: &str) -> Option<DetectedLanguage> {
        if !self.model_ready(CapabilityKind::Detector) {
            self.notify(Notice::warn("Language detection is not available"));
            return None;
        }

        let detection = async {
            let detector = self.host.create_detector(None).await?;
            detector.detect(text).await
        }
        .await;

        match detection {
            Ok(results) => results.into_iter().next(),
            Err(e) => {
                tracing::error!(error = %e, "language detection failed");
                self.notify(Notice::error("Failed to detect language"));
                None
            }
        }
    }

    fn model_ready(&self, kind: CapabilityKind) -> bool {
        self.tracker
            .model_state(kind)
            .is_some_and(|state| state.is_ready())
    }

    fn find_message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Persist a message, surfacing the failure before propagating it.
    fn persist(&mut self, message: &ChatMessage) -> Result<()> {
        self.store.save_message(message).inspect_err(|e| {
            tracing::error!(id = %message.id, error = %e, "message persistence failed");
            self.notify(Notice::error("Failed to save message"));
        })
    }

    fn append(&mut self, message: ChatMessage) {
        self.emit(ChatEvent::MessageAppended(message.clone()));
        self.messages.push(message);
    }

    fn update_content(&mut self, id: &str, content: String) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.clone();
            self.emit(ChatEvent::MessageUpdated {
                id: id.to_owned(),
                content,
            });
        }
    }

    fn remove(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
        self.emit(ChatEvent::MessageRemoved { id: id.to_owned() });
    }

    fn notify(&self, notice: Notice) {
        self.emit(ChatEvent::Notice(notice));
    }

    fn emit(&self, event: ChatEvent) {
        // Receiver may be gone (headless test); the session keeps working.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::capability::sim::SimulatedHost;
    use crate::notice::NoticeLevel;

    fn session(host: SimulatedHost) -> (ChatSession, mpsc::UnboundedReceiver<ChatEvent>) {
        let host = Arc::new(host);
        let store = Arc::new(MessageStore::in_memory().expect("store"));
        let tracker = ModelTracker::new(host.clone());
        ChatSession::new(store, tracker, host, GlossaConfig::default())
    }

    fn drain_notices(rx: &mut mpsc::UnboundedReceiver<ChatEvent>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ChatEvent::Notice(n) = event {
                notices.push(n);
            }
        }
        notices
    }

    #[tokio::test]
    async fn empty_input_is_rejected_with_warning() {
        let (mut session, mut rx) = session(SimulatedHost::ready());
        session.init().await;

        session.send("   ").await.expect("send");
        assert!(session.messages().is_empty());

        let notices = drain_notices(&mut rx);
        assert!(
            notices
                .iter()
                .any(|n| n.level == NoticeLevel::Warn && n.text.contains("empty"))
        );
    }

    #[tokio::test]
    async fn translate_without_ready_translator_warns() {
        let host = SimulatedHost::ready();
        let (mut session, mut rx) = session(host.clone());
        // No init: nothing is tracked as ready.

        session
            .translate("nonexistent", Language::Spanish)
            .await
            .expect("translate");

        assert_eq!(host.translate_calls(), 0);
        let notices = drain_notices(&mut rx);
        assert!(notices.iter().any(|n| n.text.contains("not available")));
    }

    #[tokio::test]
    async fn summary_eligibility_respects_configured_minimum() {
        let host = Arc::new(SimulatedHost::ready());
        let store = Arc::new(MessageStore::in_memory().expect("store"));
        let tracker = ModelTracker::new(host.clone());
        let mut config = GlossaConfig::default();
        config.summary.min_chars = 10;
        let (session, _rx) = ChatSession::new(store, tracker, host, config);

        let message = ChatMessage::user(
            "0123456789",
            Some(DetectedLanguage {
                language: "en".to_owned(),
                confidence: 0.9,
            }),
        );
        assert!(session.summary_eligible(&message));
    }
}
