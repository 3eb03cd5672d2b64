//! Error types for the doc2mcq library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the document cannot be read at all
//!   (not a recognised container, file missing, output not writable).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`BlockRejection`] — **Non-fatal**: one candidate question block could
//!   not be turned into a question (missing options, empty option text) but
//!   every other block is fine. Recorded in
//!   [`crate::output::Diagnostics`] so callers can tell "no questions found"
//!   apart from "document unreadable".

use crate::output::OptionLetter;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2mcq library.
///
/// Block-level failures use [`BlockRejection`] and are stored in
/// [`crate::output::Diagnostics`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Decode errors ─────────────────────────────────────────────────────
    /// The byte stream is not a document container we can decode.
    #[error("Unsupported document format: {detail}")]
    UnsupportedFormat { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
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

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Extraction of one document exceeded the configured per-document bound.
    #[error("Extraction of '{path}' timed out after {secs}s")]
    Timeout { path: PathBuf, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        ExtractError::UnsupportedFormat {
            detail: detail.into(),
        }
    }
}

/// Why a single question block was dropped from the output.
///
/// The `Display` text is what ends up in
/// [`crate::output::Diagnostics::rejected_reasons`]. `block` is the
/// 1-based position of the block in segmentation order.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BlockRejection {
    /// No boundary pattern matched twice, so the whole text is one block.
    #[error("Block {block}: no question boundaries found")]
    NoQuestionBoundaries { block: usize },

    /// No option-marker style matched even the first option.
    #[error("Block {block}: no recognisable option markers")]
    NoOptionMarkers { block: usize },

    /// Some, but not all four, option markers were found in order.
    #[error("Block {block}: only {found} of 4 options found")]
    IncompleteOptions { block: usize, found: usize },

    /// All four markers were found but one of them has no text.
    #[error("Block {block}: option {letter} is empty")]
    EmptyOption { block: usize, letter: OptionLetter },

    /// No answer marker, and the configured policy rejects unanswered blocks.
    #[error("Block {block}: no answer marker found")]
    MissingAnswer { block: usize },
}
