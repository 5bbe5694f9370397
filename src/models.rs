//! Model availability tracking for host AI capabilities.
//!
//! Mirrors the readiness of each capability into a typed status and
//! broadcasts changes to subscribers. Per capability the state machine is
//! `unavailable ⇄ downloading → ready`, with `downloading → unavailable`
//! on failure; nothing leaves `ready` within a session.

use crate::capability::{
    Availability, CapabilityHost, CapabilityKind, DownloadProgress, ProgressMonitor,
    SummarizerOptions, TranslatorOptions,
};
use crate::config::TranslationConfig;
use crate::notice::Notice;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// Availability status of one capability's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Unavailable,
    Downloading,
    Ready,
}

/// One capability's runtime availability, as last observed.
///
/// Constructors enforce the invariant that `progress` is present iff the
/// status is [`ModelStatus::Downloading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelState {
    status: ModelStatus,
    progress: Option<DownloadProgress>,
}

impl ModelState {
    pub fn unavailable() -> Self {
        Self {
            status: ModelStatus::Unavailable,
            progress: None,
        }
    }

    pub fn ready() -> Self {
        Self {
            status: ModelStatus::Ready,
            progress: None,
        }
    }

    pub fn downloading(progress: Option<DownloadProgress>) -> Self {
        Self {
            status: ModelStatus::Downloading,
            progress,
        }
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    /// Byte counters for the in-flight download, when downloading.
    pub fn progress(&self) -> Option<DownloadProgress> {
        self.progress
    }

    pub fn is_ready(&self) -> bool {
        self.status == ModelStatus::Ready
    }
}

type ModelCallback = Arc<dyn Fn(&ModelState) + Send + Sync>;

struct TrackerInner {
    host: Arc<dyn CapabilityHost>,
    states: Mutex<HashMap<CapabilityKind, ModelState>>,
    listeners: Mutex<HashMap<CapabilityKind, Vec<(u64, ModelCallback)>>>,
    next_listener_id: AtomicU64,
    notices: Mutex<Option<mpsc::UnboundedSender<Notice>>>,
    translation: TranslationConfig,
}

/// Deregistration token returned by [`ModelTracker::subscribe`].
///
/// Cancelling is idempotent; dropping the token does **not** remove the
/// listener.
pub struct Subscription {
    inner: Weak<TrackerInner>,
    kind: CapabilityKind,
    id: u64,
}

impl Subscription {
    /// Remove the listener. No-op if it was already removed.
    pub fn cancel(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Ok(mut listeners) = inner.listeners.lock()
            && let Some(entries) = listeners.get_mut(&self.kind)
        {
            entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Tracks and broadcasts model availability for all capabilities.
#[derive(Clone)]
pub struct ModelTracker {
    inner: Arc<TrackerInner>,
}

impl ModelTracker {
    pub fn new(host: Arc<dyn CapabilityHost>) -> Self {
        Self::with_translation(host, TranslationConfig::default())
    }

    /// Tracker whose warm-up translator uses the configured language pair.
    pub fn with_translation(host: Arc<dyn CapabilityHost>, translation: TranslationConfig) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                host,
                states: Mutex::new(HashMap::new()),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
                notices: Mutex::new(None),
                translation,
            }),
        }
    }

    /// Route user-visible notices (download failures) to `sink`.
    pub fn set_notice_sink(&self, sink: mpsc::UnboundedSender<Notice>) {
        if let Ok(mut notices) = self.inner.notices.lock() {
            *notices = Some(sink);
        }
    }

    /// Register `callback` for every future state change of `kind`.
    ///
    /// Replay-last-value semantics: if a state is already cached for
    /// `kind`, the callback is invoked with it immediately. Nothing is
    /// replayed when the tracker has no cached state yet.
    ///
    /// The callback runs outside the listener table lock, so it may
    /// cancel its own subscription or register new ones.
    pub fn subscribe(
        &self,
        kind: CapabilityKind,
        callback: impl Fn(&ModelState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        let callback: ModelCallback = Arc::new(callback);

        // Read the replay state and register under one listener-table
        // lock acquisition, so no broadcast lands between the two. The
        // replay itself runs after the guard is dropped.
        let replay = match self.inner.listeners.lock() {
            Ok(mut listeners) => {
                let current = self
                    .inner
                    .states
                    .lock()
                    .ok()
                    .and_then(|states| states.get(&kind).copied());
                listeners
                    .entry(kind)
                    .or_default()
                    .push((id, Arc::clone(&callback)));
                current
            }
            Err(_) => None,
        };
        if let Some(state) = replay {
            callback(&state);
        }

        Subscription {
            inner: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Last cached state for `kind`, if any check has run.
    pub fn model_state(&self, kind: CapabilityKind) -> Option<ModelState> {
        self.inner
            .states
            .lock()
            .ok()
            .and_then(|states| states.get(&kind).copied())
    }

    /// Sequentially check all capabilities at startup.
    ///
    /// Sequential by design: total startup latency is the sum of the
    /// three probes.
    pub async fn initialize_models(&self) {
        for kind in CapabilityKind::ALL {
            self.check_model(kind).await;
        }
    }

    /// Probe the host for `kind` and drive the state machine.
    ///
    /// Host errors never propagate: they are logged and collapse to
    /// `Unavailable`.
    pub async fn check_model(&self, kind: CapabilityKind) -> ModelState {
        match self.inner.host.availability(kind).await {
            Ok(Availability::Unavailable) => self.notify(kind, ModelState::unavailable()),
            Ok(Availability::Readily) => self.notify(kind, ModelState::ready()),
            Ok(Availability::AfterDownload) => self.download(kind).await,
            Err(e) => {
                tracing::error!(capability = %kind, error = %e, "capability probe failed");
                self.notify(kind, ModelState::unavailable())
            }
        }
    }

    /// Re-probe `kind` and report whether it ended up ready.
    ///
    /// Always re-runs the full check; never trusts the cache.
    pub async fn ensure_model_ready(&self, kind: CapabilityKind) -> bool {
        self.check_model(kind).await.is_ready()
    }

    /// Drive the download flow for a downloadable capability.
    ///
    /// The created instance is dropped immediately; this warms the host's
    /// model cache so later per-operation creations resolve instantly.
    async fn download(&self, kind: CapabilityKind) -> ModelState {
        self.notify(kind, ModelState::downloading(None));

        let monitor: ProgressMonitor = {
            let tracker = self.clone();
            Arc::new(move |progress| {
                tracker.notify(kind, ModelState::downloading(Some(progress)));
            })
        };

        let created = match kind {
            CapabilityKind::Summarizer => self
                .inner
                .host
                .create_summarizer(SummarizerOptions::default(), Some(monitor))
                .await
                .map(drop),
            CapabilityKind::Translator => {
                let pair = TranslatorOptions::new(
                    self.inner.translation.warm_source.clone(),
                    self.inner.translation.warm_target.clone(),
                );
                self.inner
                    .host
                    .create_translator(pair, Some(monitor))
                    .await
                    .map(drop)
            }
            CapabilityKind::Detector => self
                .inner
                .host
                .create_detector(Some(monitor))
                .await
                .map(drop),
        };

        match created {
            Ok(()) => self.notify(kind, ModelState::ready()),
            Err(e) => {
                tracing::error!(capability = %kind, error = %e, "model download failed");
                self.send_notice(Notice::error(format!(
                    "Failed to download {kind} model. Please try again."
                )));
                self.notify(kind, ModelState::unavailable())
            }
        }
    }

    /// Cache the new state and invoke every listener for `kind`.
    ///
    /// The listener list is cloned out and the lock released before any
    /// callback runs, so a callback cancelling its own subscription (or
    /// registering another) cannot deadlock the tracker.
    fn notify(&self, kind: CapabilityKind, state: ModelState) -> ModelState {
        if let Ok(mut states) = self.inner.states.lock() {
            states.insert(kind, state);
        }
        let callbacks: Vec<ModelCallback> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners
                .get(&kind)
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        for callback in &callbacks {
            callback(&state);
        }
        state
    }

    fn send_notice(&self, notice: Notice) {
        if let Ok(notices) = self.inner.notices.lock()
            && let Some(sink) = notices.as_ref()
        {
            let _ = sink.send(notice);
        }
    }
}
