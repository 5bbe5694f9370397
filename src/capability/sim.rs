//! Deterministic in-process capability host for the harness and tests.
//!
//! Simulates the full host lifecycle without any real model: scriptable
//! availability per capability, a fake weight download that feeds the
//! progress monitor, stopword-based language detection over the six
//! supported languages, tag-prefix translation, and chunked streaming
//! summarization. Per-operation call counters make provider interactions
//! observable from tests.

use super::{
    Availability, CapabilityHost, CapabilityKind, DownloadProgress, LanguageDetector,
    ProgressMonitor, Summarizer, SummarizerOptions, SummaryStream, Translator, TranslatorOptions,
};
use crate::error::{ChatError, Result};
use crate::message::DetectedLanguage;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Simulated download size in bytes.
const DOWNLOAD_TOTAL_BYTES: u64 = 4_000_000;

/// Number of progress events emitted per simulated download.
const DOWNLOAD_STEPS: u64 = 4;

/// Words per streamed summary chunk.
const SUMMARY_CHUNK_WORDS: usize = 3;

/// Maximum words in a simulated summary.
const SUMMARY_MAX_WORDS: usize = 12;

#[derive(Default)]
struct Counters {
    availability: AtomicUsize,
    create: AtomicUsize,
    detect: AtomicUsize,
    translate: AtomicUsize,
    summarize: AtomicUsize,
}

struct SimInner {
    availability: Mutex<HashMap<CapabilityKind, Availability>>,
    fail_create: Mutex<HashSet<CapabilityKind>>,
    fail_streaming: AtomicBool,
    empty_streaming: AtomicBool,
    counters: Counters,
}

/// Scriptable capability host with deterministic behavior.
#[derive(Clone)]
pub struct SimulatedHost {
    inner: Arc<SimInner>,
}

impl SimulatedHost {
    /// Host with every capability readily available.
    pub fn ready() -> Self {
        Self::with_availability(Availability::Readily)
    }

    /// Host with every capability in the given availability class.
    pub fn with_availability(availability: Availability) -> Self {
        let map = CapabilityKind::ALL
            .into_iter()
            .map(|k| (k, availability))
            .collect();
        Self {
            inner: Arc::new(SimInner {
                availability: Mutex::new(map),
                fail_create: Mutex::new(HashSet::new()),
                fail_streaming: AtomicBool::new(false),
                empty_streaming: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    /// Override one capability's availability class.
    pub fn set_availability(&self, kind: CapabilityKind, availability: Availability) {
        if let Ok(mut map) = self.inner.availability.lock() {
            map.insert(kind, availability);
        }
    }

    /// Make instance creation fail for `kind` (mid-download for
    /// downloadable capabilities).
    pub fn fail_create(&self, kind: CapabilityKind) {
        if let Ok(mut set) = self.inner.fail_create.lock() {
            set.insert(kind);
        }
    }

    /// Make streaming summarization fail before the first chunk.
    pub fn fail_streaming(&self) {
        self.inner.fail_streaming.store(true, Ordering::SeqCst);
    }

    /// Make streaming summarization complete without yielding any chunk.
    pub fn empty_streaming(&self) {
        self.inner.empty_streaming.store(true, Ordering::SeqCst);
    }

    /// Number of `availability` probes served.
    pub fn availability_calls(&self) -> usize {
        self.inner.counters.availability.load(Ordering::SeqCst)
    }

    /// Number of instances created (all kinds).
    pub fn create_calls(&self) -> usize {
        self.inner.counters.create.load(Ordering::SeqCst)
    }

    /// Number of `detect` invocations served.
    pub fn detect_calls(&self) -> usize {
        self.inner.counters.detect.load(Ordering::SeqCst)
    }

    /// Number of `translate` invocations served.
    pub fn translate_calls(&self) -> usize {
        self.inner.counters.translate.load(Ordering::SeqCst)
    }

    /// Number of `summarize` / `summarize_streaming` invocations served.
    pub fn summarize_calls(&self) -> usize {
        self.inner.counters.summarize.load(Ordering::SeqCst)
    }

    /// Simulate the weight download for `kind`, feeding the monitor.
    ///
    /// Downloadable capabilities flip to `Readily` once fetched, so a
    /// later re-probe sees the cached weights. Scripted creation failures
    /// abort mid-download after emitting partial progress.
    fn run_download(&self, kind: CapabilityKind, monitor: Option<&ProgressMonitor>) -> Result<()> {
        self.inner.counters.create.fetch_add(1, Ordering::SeqCst);

        let fails = self
            .inner
            .fail_create
            .lock()
            .map(|set| set.contains(&kind))
            .unwrap_or(false);

        let needs_download = self
            .inner
            .availability
            .lock()
            .ok()
            .and_then(|map| map.get(&kind).copied())
            == Some(Availability::AfterDownload);

        if needs_download {
            for step in 1..=DOWNLOAD_STEPS {
                if fails && step > DOWNLOAD_STEPS / 2 {
                    return Err(ChatError::Capability(format!(
                        "{kind} download failed (simulated)"
                    )));
                }
                if let Some(monitor) = monitor {
                    monitor(DownloadProgress {
                        loaded: DOWNLOAD_TOTAL_BYTES * step / DOWNLOAD_STEPS,
                        total: DOWNLOAD_TOTAL_BYTES,
                    });
                }
            }
            self.set_availability(kind, Availability::Readily);
        } else if fails {
            return Err(ChatError::Capability(format!(
                "{kind} instantiation failed (simulated)"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CapabilityHost for SimulatedHost {
    async fn availability(&self, kind: CapabilityKind) -> Result<Availability> {
        self.inner
            .counters
            .availability
            .fetch_add(1, Ordering::SeqCst);
        let map = self
            .inner
            .availability
            .lock()
            .map_err(|_| ChatError::Capability("availability map poisoned".to_owned()))?;
        Ok(map.get(&kind).copied().unwrap_or(Availability::Unavailable))
    }

    async fn create_detector(
        &self,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn LanguageDetector>> {
        self.run_download(CapabilityKind::Detector, monitor.as_ref())?;
        Ok(Box::new(SimDetector {
            host: self.clone(),
        }))
    }

    async fn create_translator(
        &self,
        options: TranslatorOptions,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Translator>> {
        self.run_download(CapabilityKind::Translator, monitor.as_ref())?;
        Ok(Box::new(SimTranslator {
            host: self.clone(),
            options,
        }))
    }

    async fn create_summarizer(
        &self,
        _options: SummarizerOptions,
        monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Summarizer>> {
        self.run_download(CapabilityKind::Summarizer, monitor.as_ref())?;
        Ok(Box::new(SimSummarizer {
            host: self.clone(),
        }))
    }
}

struct SimDetector {
    host: SimulatedHost,
}

#[async_trait]
impl LanguageDetector for SimDetector {
    async fn detect(&self, text: &str) -> Result<Vec<DetectedLanguage>> {
        self.host
            .inner
            .counters
            .detect
            .fetch_add(1, Ordering::SeqCst);
        Ok(detect_by_stopwords(text))
    }
}

struct SimTranslator {
    host: SimulatedHost,
    options: TranslatorOptions,
}

#[async_trait]
impl Translator for SimTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        self.host
            .inner
            .counters
            .translate
            .fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {text}", self.options.target))
    }
}

struct SimSummarizer {
    host: SimulatedHost,
}

#[async_trait]
impl Summarizer for SimSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.host
            .inner
            .counters
            .summarize
            .fetch_add(1, Ordering::SeqCst);
        Ok(truncate_words(text))
    }

    async fn summarize_streaming(&self, text: &str) -> Result<SummaryStream> {
        self.host
            .inner
            .counters
            .summarize
            .fetch_add(1, Ordering::SeqCst);

        let fail = self.host.inner.fail_streaming.load(Ordering::SeqCst);
        let empty = self.host.inner.empty_streaming.load(Ordering::SeqCst);
        let summary = truncate_words(text);
        let chunks: Vec<String> = summary
            .split_whitespace()
            .collect::<Vec<_>>()
            .chunks(SUMMARY_CHUNK_WORDS)
            .map(|c| {
                let mut s = c.join(" ");
                s.push(' ');
                s
            })
            .collect();

        let stream = async_stream::stream! {
            if fail {
                yield Err(ChatError::Summarize(
                    "streaming failed before first chunk (simulated)".to_owned(),
                ));
                return;
            }
            if empty {
                return;
            }
            for chunk in chunks {
                yield Ok(chunk);
            }
        };
        Ok(Box::pin(stream))
    }
}

/// First words of the text, with a trailing ellipsis when truncated.
fn truncate_words(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= SUMMARY_MAX_WORDS {
        words.join(" ")
    } else {
        let mut out = words[..SUMMARY_MAX_WORDS].join(" ");
        out.push('…');
        out
    }
}

/// Stopword sets per language. Deliberately small; the point is
/// determinism for the harness and tests, not detection quality.
const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "is", "of", "to", "hello", "world", "you"]),
    ("es", &["el", "los", "es", "hola", "mundo", "que", "una", "y"]),
    ("fr", &["le", "les", "est", "bonjour", "monde", "je", "une", "et"]),
    ("pt", &["os", "as", "olá", "não", "uma", "você", "para", "em"]),
    ("tr", &["ve", "bir", "bu", "için", "merhaba", "dünya", "ben"]),
];

/// Rank languages by stopword hits; Cyrillic short-circuits to Russian.
fn detect_by_stopwords(text: &str) -> Vec<DetectedLanguage> {
    if text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)) {
        return vec![DetectedLanguage {
            language: "ru".to_owned(),
            confidence: 0.98,
        }];
    }

    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<DetectedLanguage> = STOPWORDS
        .iter()
        .filter_map(|(lang, stopwords)| {
            let hits = words.iter().filter(|w| stopwords.contains(&w.as_str())).count();
            if hits == 0 {
                return None;
            }
            let confidence = (hits as f64 / words.len() as f64).min(0.99);
            Some(DetectedLanguage {
                language: (*lang).to_owned(),
                confidence,
            })
        })
        .collect();

    if ranked.is_empty() {
        // No evidence either way; report English at coin-flip confidence.
        return vec![DetectedLanguage {
            language: "en".to_owned(),
            confidence: 0.5,
        }];
    }

    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
