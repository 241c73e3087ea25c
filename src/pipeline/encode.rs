//! Transport encoding: raw bytes → base64 [`InlinePayload`], and data URLs.
//!
//! Multimodal APIs accept documents inline as base64 inside the JSON request
//! body, tagged with their MIME type. A data URL
//! (`data:<mime>;base64,<payload>`) carries the same two pieces in one
//! string, which is what the session keeps as the file preview.

use crate::error::ValidationError;
use crate::pipeline::input::{DocumentKind, UploadedFile};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A document ready to be inlined into an inference request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinePayload {
    pub kind: DocumentKind,
    /// Standard base64, no line breaks.
    pub data: String,
}

impl std::fmt::Debug for InlinePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlinePayload")
            .field("kind", &self.kind)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl InlinePayload {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.kind.mime_type(), self.data)
    }
}

/// Base64-encode raw bytes of a known kind.
pub fn encode_bytes(kind: DocumentKind, bytes: &[u8]) -> InlinePayload {
    let data = STANDARD.encode(bytes);
    debug!("Encoded {} → {} bytes base64", kind, data.len());
    InlinePayload { kind, data }
}

/// Encode an uploaded file, checking its declared type.
pub fn encode_upload(file: &UploadedFile) -> Result<InlinePayload, ValidationError> {
    let kind = file.kind().ok_or_else(|| ValidationError::UnsupportedFormat {
        mime_type: file.mime_type.clone(),
    })?;
    Ok(encode_bytes(kind, &file.raw_bytes))
}

/// Build the data URL for an uploaded file (the session's preview).
pub fn to_data_url(file: &UploadedFile) -> Result<String, ValidationError> {
    encode_upload(file).map(|p| p.to_data_url())
}

static RE_DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;]+);base64,(.+)$").unwrap());

/// Split a data URL into its MIME type and base64 payload.
///
/// A string that is not of the form `data:<mime>;base64,<payload>` is
/// [`ValidationError::MalformedDataUrl`]; a well-formed URL whose MIME type
/// is not one of the accepted kinds is [`ValidationError::UnsupportedFormat`].
pub fn parse_data_url(url: &str) -> Result<InlinePayload, ValidationError> {
    let caps = RE_DATA_URL
        .captures(url.trim())
        .ok_or(ValidationError::MalformedDataUrl)?;
    let mime = &caps[1];
    let kind = DocumentKind::from_mime(mime).ok_or_else(|| ValidationError::UnsupportedFormat {
        mime_type: mime.to_string(),
    })?;
    Ok(InlinePayload {
        kind,
        data: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pdf_bytes() {
        let p = encode_bytes(DocumentKind::Pdf, b"%PDF-1.4");
        assert_eq!(p.mime_type(), "application/pdf");
        assert_eq!(STANDARD.decode(&p.data).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn data_url_shape() {
        let f = UploadedFile::new("a.png", "image/png", vec![1, 2, 3]);
        assert_eq!(to_data_url(&f).unwrap(), "data:image/png;base64,AQID");
    }

    #[test]
    fn parse_extracts_mime_and_payload() {
        let p = parse_data_url("data:image/webp;base64,UklGRg==").unwrap();
        assert_eq!(p.kind, DocumentKind::Webp);
        assert_eq!(p.data, "UklGRg==");
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "",
            "image/png;base64,AAAA",
            "data:image/png,AAAA",
            "data:;base64,AAAA",
            "data:image/png;base64,",
        ] {
            assert_eq!(
                parse_data_url(bad),
                Err(ValidationError::MalformedDataUrl),
                "input: {bad:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_unsupported_mime() {
        assert!(matches!(
            parse_data_url("data:text/plain;base64,aGk="),
            Err(ValidationError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn encode_upload_rejects_unknown_type() {
        let f = UploadedFile::new("notes.txt", "text/plain", b"hi".to_vec());
        assert!(encode_upload(&f).is_err());
    }
}
