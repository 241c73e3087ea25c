//! Input validation: the uploaded résumé and the job fields.
//!
//! Validation never touches the network. A rejected file leaves the caller's
//! previous state untouched; the only observable effect is the error message.
//!
//! The size limit is checked before the format so an oversized file of the
//! wrong type reports the size problem first.

use crate::error::{AuditError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default upload limit: 4 MiB.
pub const MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;

/// MIME type recorded when neither the extension nor the content identify the file.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// The four document kinds the provider accepts inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Webp,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Pdf,
        DocumentKind::Png,
        DocumentKind::Jpeg,
        DocumentKind::Webp,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Webp => "image/webp",
        }
    }

    /// Exact match on the canonical MIME string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.mime_type() == mime)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            "webp" => Some(DocumentKind::Webp),
            _ => None,
        }
    }

    /// Identify a document from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(DocumentKind::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(DocumentKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(DocumentKind::Jpeg)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(DocumentKind::Webp)
        } else {
            None
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, DocumentKind::Pdf)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Target role the résumé is audited against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub title: String,
    /// Optional; an empty string means "not given".
    pub company: String,
    pub description: String,
}

impl JobDetails {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: String::new(),
            description: description.into(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// Company name, or `None` when blank.
    pub fn company(&self) -> Option<&str> {
        let c = self.company.trim();
        (!c.is_empty()).then_some(c)
    }
}

/// A résumé as selected by the user, before encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub raw_bytes: Vec<u8>,
    /// MIME type as declared by the source (browser, extension, …), not verified.
    pub mime_type: String,
    pub size_bytes: u64,
    pub display_name: String,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("display_name", &self.display_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

impl UploadedFile {
    pub fn new(
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        raw_bytes: Vec<u8>,
    ) -> Self {
        Self {
            size_bytes: raw_bytes.len() as u64,
            raw_bytes,
            mime_type: mime_type.into(),
            display_name: display_name.into(),
        }
    }

    /// The accepted kind, if the declared MIME type is one of the four.
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.mime_type)
    }
}

/// Accept a file only if it is within `limit` bytes and of an allowed type.
pub fn validate_file(file: &UploadedFile, limit: u64) -> Result<DocumentKind, ValidationError> {
    if file.size_bytes > limit {
        return Err(ValidationError::FileTooLarge {
            size: file.size_bytes,
            limit,
        });
    }
    file.kind().ok_or_else(|| ValidationError::UnsupportedFormat {
        mime_type: file.mime_type.clone(),
    })
}

/// Require a non-blank title and description. Company is optional.
pub fn validate_job_details(job: &JobDetails) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if job.title.trim().is_empty() {
        missing.push("title");
    }
    if job.description.trim().is_empty() {
        missing.push("description");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingInput { missing })
    }
}

/// Read a résumé from disk into an [`UploadedFile`].
///
/// The size limit is enforced from metadata before any bytes are read, so an
/// oversized file is never loaded into memory. The declared MIME type comes
/// from the extension, then from magic bytes, else [`UNKNOWN_MIME`].
pub async fn load_upload(path: impl AsRef<Path>, limit: u64) -> Result<UploadedFile, AuditError> {
    let path = path.as_ref();
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_error(path.to_path_buf(), e))?;

    if !meta.is_file() {
        return Err(AuditError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if meta.len() > limit {
        return Err(ValidationError::FileTooLarge {
            size: meta.len(),
            limit,
        }
        .into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_error(path.to_path_buf(), e))?;

    let kind = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentKind::from_extension)
        .or_else(|| DocumentKind::sniff(&bytes));
    let mime = kind.map(|k| k.mime_type()).unwrap_or(UNKNOWN_MIME);

    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!(
        "Loaded {} ({} bytes, {})",
        display_name,
        bytes.len(),
        mime
    );
    Ok(UploadedFile::new(display_name, mime, bytes))
}

fn io_error(path: PathBuf, e: std::io::Error) -> AuditError {
    match e.kind() {
        std::io::ErrorKind::NotFound => AuditError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => AuditError::PermissionDenied { path },
        _ => AuditError::ReadFailed { path, source: e },
    }
}
