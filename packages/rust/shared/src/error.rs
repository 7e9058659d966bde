//! Error types for wikiscribe.
//!
//! Library crates use [`WikiError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all wikiscribe operations.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// Configuration loading or validation error. Fatal at startup.
    #[error("config error: {message}")]
    Config { message: String },

    /// The URL matches none of the known wiki path patterns.
    #[error("unroutable URL: {url}")]
    Unroutable { url: String },

    /// The wiki answered with HTTP 404.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The wiki answered with a non-2xx status other than 404.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// Connection-level failure (connect, timeout, body read).
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Expected markup was absent from the parsed HTML.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A spawned indexing task could not complete.
    #[error("task error: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WikiError>;

impl WikiError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
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

    /// Map a non-2xx status to the matching error variant.
    pub fn from_status(url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        if status == 404 {
            Self::NotFound { url }
        } else {
            Self::Http { url, status }
        }
    }
}
