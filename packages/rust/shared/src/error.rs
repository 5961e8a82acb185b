//! Error types for SeoWriter.
//!
//! Library crates use [`SeoWriterError`] via `thiserror`. Every pipeline stage
//! returns [`Result`], so a stage outcome is either a payload or exactly one
//! error. The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all SeoWriter operations.
#[derive(Debug, thiserror::Error)]
pub enum SeoWriterError {
    /// Configuration loading or validation error (invalid provider, missing key).
    #[error("config error: {message}")]
    Config { message: String },

    /// Prompt template could not be rendered or failed load-time checks.
    #[error("template error: {message}")]
    Template { message: String },

    /// Search stage failure.
    #[error("search failed: {0}")]
    Search(String),

    /// Fetch stage failure (only raised when no URL yielded content).
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Summarize stage failure, carrying the chat failure message.
    #[error("summarization failed: {0}")]
    Summarize(String),

    /// Chat session could not be constructed.
    #[error("error initializing AI chat: {0}")]
    ChatInit(String),

    /// A chat turn failed after retries, or aborted on an unexpected error.
    #[error("AI chat failed: {0}")]
    Chat(String),

    /// A configured generation step failed. `index` is zero-based.
    #[error("generation step {index} failed: {message}")]
    Step { index: usize, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase. Doubles as the stage result type.
pub type Result<T> = std::result::Result<T, SeoWriterError>;

impl SeoWriterError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
