//! Configuration types for the chat session engine.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a glossa session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaConfig {
    /// Message store settings.
    pub store: StoreConfig,
    /// Summarization settings.
    pub summary: SummaryConfig,
    /// Translation settings.
    pub translation: TranslationConfig,
}

/// Message store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory holding the message database (None = platform default).
    pub data_dir: Option<PathBuf>,
}

/// Summarization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Minimum message length (in characters) eligible for summarization.
    pub min_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_chars: crate::message::MIN_CHARS_FOR_SUMMARY,
        }
    }
}

/// Translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Source language assumed when a message carries no detection metadata.
    pub default_source: String,
    /// Language pair used to warm the translator during startup checks.
    pub warm_source: String,
    /// See `warm_source`.
    pub warm_target: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_source: "en".to_owned(),
            warm_source: "en".to_owned(),
            warm_target: "es".to_owned(),
        }
    }
}

impl GlossaConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ChatError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Write configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| ChatError::Config(format!("serialize config: {e}")))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Resolve the data directory for the message store.
    pub fn data_dir(&self) -> PathBuf {
        self.store
            .data_dir
            .clone()
            .unwrap_or_else(default_data_dir)
    }
}

/// Application data root directory.
///
/// Resolves to `dirs::data_dir()/glossa/` by default. Override with the
/// `GLOSSA_DATA_DIR` environment variable.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("GLOSSA_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("glossa"))
        .unwrap_or_else(|| PathBuf::from("/tmp/glossa-data"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = GlossaConfig::default();
        assert_eq!(cfg.summary.min_chars, 150);
        assert_eq!(cfg.translation.default_source, "en");
        assert_eq!(cfg.translation.warm_target, "es");
        assert!(cfg.store.data_dir.is_none());
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let cfg = GlossaConfig::load(Path::new("/nonexistent/glossa.toml")).expect("load");
        assert_eq!(cfg.summary.min_chars, 150);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut cfg = GlossaConfig::default();
        cfg.summary.min_chars = 200;
        cfg.translation.default_source = "fr".to_owned();
        cfg.save(&path).expect("save");

        let loaded = GlossaConfig::load(&path).expect("load");
        assert_eq!(loaded.summary.min_chars, 200);
        assert_eq!(loaded.translation.default_source, "fr");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: GlossaConfig = toml::from_str("[summary]\nmin_chars = 99\n").expect("parse");
        assert_eq!(cfg.summary.min_chars, 99);
        assert_eq!(cfg.translation.warm_source, "en");
    }
}
