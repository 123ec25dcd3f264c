//! Error types for the pdf2pubmed library.
//!
//! A single [`ConvertError`] covers every way a conversion attempt can fail.
//! The variants fall into three groups that callers usually treat
//! differently:
//!
//! * **User input**: no usable PDF (wrong type, too large, unreadable).
//!   The user fixes the selection and tries again.
//! * **Transport / server**: the request never completed or the service
//!   answered with a non-2xx status. [`ConvertError::Rejected`] displays
//!   exactly the message the service put in its `error` field.
//! * **Malformed archive**: the service answered 2xx but the body is not a
//!   ZIP, or its `validation_report.json` is not valid JSON.
//!
//! Whichever group, the session returns to `Idle` and the user starts a
//! fresh attempt. There is no retry or partial-failure recovery.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2pubmed library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while loading a file into memory.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file supplied to the PDF slot is not a PDF.
    #[error("'{name}' is not a PDF file. Please select a PDF file.")]
    NotAPdf { name: String },

    /// The PDF exceeds the size the conversion service accepts.
    #[error("'{name}' is {size} bytes; the conversion service accepts at most {limit} bytes")]
    PdfTooLarge { name: String, size: u64, limit: u64 },

    // ── Session errors ────────────────────────────────────────────────────
    /// The session is waiting on the conversion service.
    #[error("A conversion is already in progress")]
    ConversionInProgress,

    /// Download requested before a conversion completed.
    #[error("Nothing to download: no completed conversion")]
    NothingToDownload,

    // ── Service errors ────────────────────────────────────────────────────
    /// The request could not be sent or the response could not be read.
    #[error("Conversion request failed: {reason}")]
    Transport { reason: String },

    /// The service answered with a non-2xx status.
    ///
    /// Displays exactly `message` so it can be shown to the user verbatim.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// The success body could not be decoded as a ZIP archive.
    #[error("Converted archive is malformed: {detail}")]
    MalformedArchive { detail: String },

    /// `validation_report.json` exists but is not valid UTF-8 JSON.
    #[error("Validation report is malformed: {detail}")]
    MalformedReport { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the downloaded archive.
    #[error("Failed to write archive '{path}': {source}")]
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

impl ConvertError {
    /// True for errors the user resolves by picking a different file.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConvertError::FileNotFound { .. }
                | ConvertError::PermissionDenied { .. }
                | ConvertError::ReadFailed { .. }
                | ConvertError::NotAPdf { .. }
                | ConvertError::PdfTooLarge { .. }
        )
    }
}
