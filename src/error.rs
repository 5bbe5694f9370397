//! Error types for the glossa session engine.

/// Top-level error type for the chat session system.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Capability probe or instantiation error.
    #[error("capability error: {0}")]
    Capability(String),

    /// Language detection error.
    #[error("detect error: {0}")]
    Detect(String),

    /// Translation error.
    #[error("translate error: {0}")]
    Translate(String),

    /// Summarization error.
    #[error("summarize error: {0}")]
    Summarize(String),

    /// Message store error.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChatError>;
