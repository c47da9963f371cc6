//! Text Extractor: turns an uploaded resume document into normalized plain text.
//!
//! Two formats are supported: PDF (via `pdf-extract`) and DOCX (OOXML package read with
//! `zip` + `quick-xml`). Extraction is a pure transformation; the only side effect is a
//! diagnostic log line on failure.

use thiserror::Error;
use tracing::error;

mod docx;
mod pdf;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Uploaded {0} document is empty")]
    EmptyInput(&'static str),

    #[error("Could not extract text from {0}. The file might be empty or corrupted.")]
    NoText(&'static str),

    #[error("{format} parsing error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Maps a declared MIME type onto a supported format.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        match mime.trim() {
            PDF_MIME => Ok(DocumentFormat::Pdf),
            DOCX_MIME => Ok(DocumentFormat::Docx),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
        }
    }
}

/// Extracts trimmed, non-empty text from `bytes`.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::EmptyInput(format.label()));
    }

    let raw = match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
    }
    .map_err(|message| {
        error!("{} parsing error: {message}", format.label());
        ExtractError::Parse {
            format: format.label(),
            message,
        }
    })?;

    let text = raw.trim();
    if text.is_empty() {
        error!("{} produced no extractable text", format.label());
        return Err(ExtractError::NoText(format.label()));
    }
    Ok(text.to_string())
}

/// Runs [`extract_text`] on the blocking pool. Parsers are CPU-bound and some panic on
/// malformed input; a panic is reported as a parse error for that request only.
pub async fn extract_text_blocking(
    bytes: bytes::Bytes,
    format: DocumentFormat,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .unwrap_or_else(|join_err| {
            error!("{} parser aborted: {join_err}", format.label());
            Err(ExtractError::Parse {
                format: format.label(),
                message: "parser aborted on malformed document".to_string(),
            })
        })
}
