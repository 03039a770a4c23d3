//! Error types for the edgequake-lawtree library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LawTreeError`] — **Fatal** for one call: the input file is missing or
//!   unreadable, the configuration is invalid, or the output cannot be
//!   written. Returned as `Err(LawTreeError)` from the `convert*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one document of a batch failed (most
//!   often because it vanished between discovery and processing) while every
//!   other document is fine. Stored inside
//!   [`crate::output::DocumentResult`] so a batch never aborts on one bad
//!   file.
//!
//! Nothing inside the per-document pipeline can fail: undecodable bytes are
//! dropped, an unmatched text becomes a single free-content segment, and the
//! ordinal resolver falls back to a sentinel.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-lawtree library.
#[derive(Debug, Error)]
pub enum LawTreeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Text file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or vocabulary validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A vocabulary entry produced a pattern the regex engine rejects.
    #[error("Vocabulary for level '{level}' does not compile: {source}")]
    InvalidPattern {
        level: String,
        #[source]
        source: regex::Error,
    },

    /// JSON (de)serialisation failed.
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The input did not exist when its turn came; the batch skips it.
    #[error("{path}: skipped, input file is missing")]
    Missing { path: String },

    /// Reading the input or writing the outputs failed.
    #[error("{path}: {detail}")]
    Failed { path: String, detail: String },
}

impl DocumentError {
    /// Classify a fatal error raised while processing `path`.
    pub fn from_fatal(path: impl Into<String>, err: &LawTreeError) -> Self {
        let path = path.into();
        match err {
            LawTreeError::FileNotFound { .. } => DocumentError::Missing { path },
            other => DocumentError::Failed {
                path,
                detail: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = LawTreeError::FileNotFound {
            path: PathBuf::from("text/law.txt"),
        };
        assert!(e.to_string().contains("text/law.txt"));
    }

    #[test]
    fn invalid_config_display() {
        let e = LawTreeError::InvalidConfig("concurrency must be ≥ 1".into());
        assert!(e.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn missing_input_is_classified_as_missing() {
        let fatal = LawTreeError::FileNotFound {
            path: PathBuf::from("a.txt"),
        };
        assert_eq!(
            DocumentError::from_fatal("a.txt", &fatal),
            DocumentError::Missing {
                path: "a.txt".into()
            }
        );
    }

    #[test]
    fn other_errors_are_classified_as_failed() {
        let fatal = LawTreeError::PermissionDenied {
            path: PathBuf::from("b.txt"),
        };
        let e = DocumentError::from_fatal("b.txt", &fatal);
        assert!(matches!(e, DocumentError::Failed { .. }));
        assert!(e.to_string().contains("Permission denied"), "got: {e}");
    }
}
