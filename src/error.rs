//! Error types for the tutor-reader library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReaderError`] — **Fatal**: the operation cannot proceed at all
//!   (chapter missing, unreadable file, provider not configured). Returned as
//!   `Err(ReaderError)` from the library and modernizer entry points.
//!
//! * [`SectionError`] — **Non-fatal**: one block failed to modernize during a
//!   batch run while the others succeeded. Stored inside
//!   [`crate::modernize::BlockModernization`] so callers keep partial results.
//!
//! The parser itself has no error path: every input yields a document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tutor-reader library.
#[derive(Debug, Error)]
pub enum ReaderError {
    // ── Library errors ───────────────────────────────────────────────────
    /// No chapter file with this name exists in the library.
    #[error("Chapter not found: '{name}'")]
    ChapterNotFound { name: String },

    /// The chapter name is empty or would escape the library directory.
    #[error("Invalid chapter name '{name}': must be a bare file stem without path separators")]
    InvalidChapterName { name: String },

    /// The file exists (or might) but reading it failed for another reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not list the library directory.
    #[error("Failed to list chapter directory '{path}': {source}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the manifest file.
    #[error("Failed to write manifest '{path}': {source}")]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest exists but is not a JSON array of names.
    #[error("Manifest '{path}' is malformed: {detail}")]
    ManifestMalformed { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error on every attempt.
    #[error("LLM API error after {attempts} attempt(s): {message}")]
    LlmApiError { attempts: u32, message: String },

    /// Modernize was called with nothing to rewrite.
    #[error("Missing text: nothing to modernize")]
    EmptyText,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReaderError {
    /// True for the "no such chapter" condition callers present as not-found
    /// rather than as a generic failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReaderError::ChapterNotFound { .. })
    }
}

/// A non-fatal error for a single block in a batch modernization.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SectionError {
    /// LLM call failed after retries.
    #[error("Section '{section_id}' block {block}: LLM call failed: {detail}")]
    LlmFailed {
        section_id: String,
        block: usize,
        detail: String,
    },
}
