//! No-op capability host for contexts with no AI surface.
//!
//! Injected instead of runtime environment sniffing: every capability
//! reports [`Availability::Unavailable`] and no instance can be created.

use super::{
    Availability, CapabilityHost, CapabilityKind, LanguageDetector, ProgressMonitor, Summarizer,
    SummarizerOptions, Translator, TranslatorOptions,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;

/// Host implementation that exposes no capabilities at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

#[async_trait]
impl CapabilityHost for NullHost {
    async fn availability(&self, _kind: CapabilityKind) -> Result<Availability> {
        Ok(Availability::Unavailable)
    }

    async fn create_detector(
        &self,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn LanguageDetector>> {
        Err(ChatError::Capability("no AI surface present".to_owned()))
    }

    async fn create_translator(
        &self,
        _options: TranslatorOptions,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Translator>> {
        Err(ChatError::Capability("no AI surface present".to_owned()))
    }

    async fn create_summarizer(
        &self,
        _options: SummarizerOptions,
        _monitor: Option<ProgressMonitor>,
    ) -> Result<Box<dyn Summarizer>> {
        Err(ChatError::Capability("no AI surface present".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_everything_unavailable() {
        let host = NullHost;
        for kind in CapabilityKind::ALL {
            let avail = host.availability(kind).await.expect("probe");
            assert_eq!(avail, Availability::Unavailable);
        }
    }

    #[tokio::test]
    async fn refuses_to_create_instances() {
        let host = NullHost;
        assert!(host.create_detector(None).await.is_err());
        assert!(
            host.create_translator(TranslatorOptions::new("en", "es"), None)
                .await
                .is_err()
        );
        assert!(
            host.create_summarizer(SummarizerOptions::default(), None)
                .await
                .is_err()
        );
    }
}
