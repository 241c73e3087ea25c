//! Error types for the resume-audit library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ValidationError`] — **Local**: the user's input was rejected before
//!   anything left the machine (file too large, wrong format, missing job
//!   fields, malformed data URL). The session keeps its previous state and
//!   only surfaces the message.
//!
//! * [`AuditError`] — **Pipeline**: everything the analysis entry points can
//!   return, including validation failures, file-system problems, and the
//!   three upstream classes (rejection, opaque failure, empty response).
//!
//! Every variant's `Display` is the message shown to the user; use
//! [`AuditError::user_message`] to get the final display string.

use std::path::PathBuf;
use thiserror::Error;

/// Size ceiling quoted to the user when the provider rejects a document.
pub const UPSTREAM_SIZE_CEILING_MB: u32 = 69;

/// Shown when an upstream failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to analyze resume. Please try again with a clear document or image.";

const MIB: u64 = 1024 * 1024;

/// Input rejected locally, before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The file exceeds the configured upload limit.
    #[error("File size too large. Please upload a file smaller than {}MB.", .limit / MIB)]
    FileTooLarge { size: u64, limit: u64 },

    /// The declared MIME type is not PDF, PNG, JPEG or WEBP.
    #[error("Unsupported file format. Please upload a PDF or an image (PNG, JPG, WEBP).")]
    UnsupportedFormat { mime_type: String },

    /// No accepted file, or the job title / description is blank.
    #[error("Please upload your resume and provide the job details.")]
    MissingInput { missing: Vec<&'static str> },

    /// The stored preview is not a `data:<mime>;base64,<payload>` string.
    #[error("Invalid file data format.")]
    MalformedDataUrl,
}

/// All errors returned by the resume-audit pipeline.
#[derive(Debug, Error)]
pub enum AuditError {
    // ── Input errors ──────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Résumé file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the résumé.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The provider refused the document itself (bad format, over its size
    /// limit). The raw provider text is kept in `detail` for logs only.
    #[error(
        "The document could not be processed. Ensure the file is a standard PDF or clear image under {}MB.",
        UPSTREAM_SIZE_CEILING_MB
    )]
    UpstreamRejection { detail: String },

    /// Any other provider failure; the message is shown verbatim.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// The provider answered without any text payload.
    #[error("No response text from AI. Document might be too large or complex.")]
    EmptyResponse,

    /// The provider's text was not a valid analysis document.
    #[error("Failed to parse analysis response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// No usable backend (missing API key, unknown provider, …).
    #[error("Inference provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// The single display string surfaced to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            AuditError::Upstream { message, .. } if message.trim().is_empty() => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// `true` for errors caused by the user's input rather than the provider.
    pub fn is_validation(&self) -> bool {
        matches!(self, AuditError::Validation(_))
    }
}
