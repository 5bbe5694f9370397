//! Glossa: local chat session engine over host-provided AI capabilities.
//!
//! This crate coordinates a chat UI's state against the asynchronous,
//! possibly slow, possibly failing lifecycles of three host AI
//! capabilities: text summarization, translation, and language detection.
//!
//! # Architecture
//!
//! The session is built from small, independently testable parts:
//! - **Capability boundary**: trait seams for the three AI capabilities
//!   plus a `CapabilityHost` factory, consumed as opaque providers
//! - **Model tracker**: per-capability availability state machine
//!   (`unavailable ⇄ downloading → ready`) with replay-last pub/sub
//! - **Message store**: SQLite persistence of chat messages, queryable
//!   by recency and by derivation back-reference
//! - **Chat session**: sequences detection → persistence → reply, and
//!   on demand translation or streamed summarization, emitting UI events

pub mod capability;
pub mod chat;
pub mod config;
pub mod error;
pub mod languages;
pub mod message;
pub mod models;
pub mod notice;
pub mod store;

pub use capability::{
    Availability, CapabilityHost, CapabilityKind, DownloadProgress, LanguageDetector,
    ProgressMonitor, Summarizer, SummaryStream, Translator,
};
pub use chat::{ChatEvent, ChatSession};
pub use config::GlossaConfig;
pub use error::{ChatError, Result};
pub use languages::Language;
pub use message::{ChatMessage, DetectedLanguage, Role, can_summarize};
pub use models::{ModelState, ModelStatus, ModelTracker, Subscription};
pub use notice::{Notice, NoticeLevel};
pub use store::MessageStore;
