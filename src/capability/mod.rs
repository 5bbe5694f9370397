//! Capability boundary: trait seams for host-provided AI capabilities.
//!
//! The host exposes three capabilities — summarization, translation, and
//! language detection — each with its own download/readiness lifecycle.
//! Everything behind [`CapabilityHost`] is consumed as an opaque provider;
//! non-interactive contexts inject [`null::NullHost`] instead of sniffing
//! the environment at runtime.

pub mod null;
pub mod sim;

use crate::error::Result;
use crate::message::DetectedLanguage;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// The three host AI capabilities this crate orchestrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Summarizer,
    Translator,
    Detector,
}

impl CapabilityKind {
    /// All capabilities, in startup-check order.
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Summarizer,
        CapabilityKind::Translator,
        CapabilityKind::Detector,
    ];

    /// Stable identifier for logs and display.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summarizer => "summarizer",
            Self::Translator => "translator",
            Self::Detector => "detector",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-reported availability class of a capability before instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The capability is absent or unsupported.
    Unavailable,
    /// Instantly usable, no download required.
    Readily,
    /// Usable after the host downloads model weights.
    AfterDownload,
}

/// Byte counters for an in-flight model download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes fetched so far.
    pub loaded: u64,
    /// Total bytes, as reported by the host.
    pub total: u64,
}

/// Callback invoked with progress events while the host fetches weights.
pub type ProgressMonitor = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// A finite, non-restartable stream of summary text deltas.
pub type SummaryStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Language pair a translator instance is created for.
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    pub source: String,
    pub target: String,
}

impl TranslatorOptions {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Summarizer creation options, mirroring the host's knobs.
#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    /// Summary style (e.g. `"tl;dr"`).
    pub style: String,
    /// Output format (e.g. `"plain-text"`).
    pub format: String,
    /// Target length (e.g. `"short"`).
    pub length: String,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            style: "tl;dr".to_owned(),
            format: "plain-text".to_owned(),
            length: "short".to_owned(),
        }
    }
}

/// Language detection capability.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`, ranked by confidence descending.
    async fn detect(&self, text: &str) -> Result<Vec<DetectedLanguage>>;
}

/// Translation capability, bound to its creation-time language pair.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Summarization capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a complete summary in one shot.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Produce the summary as an incremental stream of text deltas.
    async fn summarize_streaming(&self, text: &str) -> Result<SummaryStream>;
}

/// Host contract. New hosts only need to implement this trait.
///
/// Creation factories resolve only once the instance is ready to use;
/// while the host fetches model weights, the optional monitor receives
/// [`DownloadProgress`] events.
#[async_trait]
pub trait CapabilityHost: Send + Sync {
    /// Probe a capability's availability class.
    async fn availability(&self, kind: CapabilityKind) -> Result<Availability>;

    /// Create a ready language detector instance.
    async fn create_detector(
        &self,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn LanguageDetector>>;

    /// Create a ready translator instance for the given language pair.
    async fn create_translator(
        &self,
        options: TranslatorOptions,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Translator>>;

    /// Create a ready summarizer instance.
    async fn create_summarizer(
        &self,
        options: SummarizerOptions,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Summarizer>>;
}
