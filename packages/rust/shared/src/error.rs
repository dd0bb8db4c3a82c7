//! Error types for Notebase.
//!
//! Library crates use [`NotebaseError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Notebase operations.
#[derive(Debug, thiserror::Error)]
pub enum NotebaseError {
    /// Malformed Markdown: unterminated fence, bad heading nesting, empty heading.
    #[error("parse error in {source_file} at line {line}: {message}")]
    Parse {
        source_file: String,
        line: usize,
        message: String,
    },

    /// Lookup of a topic that is not in the store.
    #[error("topic not found: {topic}")]
    NotFound { topic: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Data validation error (empty topic path, unsupported snapshot, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NotebaseError>;

impl NotebaseError {
    /// Create a parse error located at `line` of `source_file`.
    pub fn parse(source_file: impl Into<String>, line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            source_file: source_file.into(),
            line,
            message: msg.into(),
        }
    }

    /// Create a not-found error for a topic key.
    pub fn not_found(topic: impl Into<String>) -> Self {
        Self::NotFound {
            topic: topic.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Whether this is a recoverable topic lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
