//! Error taxonomy for the index engine.
//!
//! Every failure carries a machine-checkable kind plus a short explanation.
//! Callers (the CLI, a protocol adapter) match on the variant; humans read
//! the message. Raw I/O errors are wrapped so they never surface bare.

use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of characters of file content quoted in error messages.
pub const ERROR_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was requested before a project path was set.
    #[error("project path not set; call set_project_path first")]
    NotInitialized,

    /// The project path does not exist or is not a directory.
    #[error("invalid project path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// A single file failed to parse. Non-fatal during bulk indexing.
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },

    /// A symbol lookup found nothing.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The target file of an edit does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Expected content was not present in the file, even after
    /// whitespace normalization.
    #[error("content mismatch in {path}: expected {expected:?}..., found {found:?}...")]
    ContentMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A write failed during the apply phase. The batch has been rolled back.
    #[error("write failed for {path}: {reason}")]
    WriteFailure { path: String, reason: String },

    /// The query itself is malformed (e.g. an invalid regex pattern).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An edit request failed validation before touching any file.
    #[error("validation error: {0}")]
    Validation(String),

    /// The coarse index lock could not be acquired within the bounded wait.
    #[error("timed out waiting for the index lock")]
    ConcurrencyConflict,

    /// Underlying I/O failure outside the edit apply phase.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stable machine-readable kind string, independent of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::InvalidPath { .. } => "invalid_path",
            Self::ParseFailure { .. } => "parse_failure",
            Self::SymbolNotFound(_) => "symbol_not_found",
            Self::FileNotFound(_) => "file_not_found",
            Self::ContentMismatch { .. } => "content_mismatch",
            Self::WriteFailure { .. } => "write_failure",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Validation(_) => "validation_error",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::Io(_) => "io_error",
        }
    }
}

/// Truncate content to [`ERROR_PREVIEW_CHARS`] for inclusion in an error
/// message, so mismatch reports never dump whole files.
pub fn content_preview(content: &str) -> String {
    if content.chars().count() <= ERROR_PREVIEW_CHARS {
        content.to_string()
    } else {
        content.chars().take(ERROR_PREVIEW_CHARS).collect()
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_content() {
        let long = "x".repeat(200);
        assert_eq!(content_preview(&long).len(), ERROR_PREVIEW_CHARS);
        assert_eq!(content_preview("short"), "short");
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(EngineError::NotInitialized.kind(), "not_initialized");
        assert_eq!(
            EngineError::InvalidQuery("bad".into()).kind(),
            "invalid_query"
        );
    }
}
