//! Requirements documents: sniff an upload and turn it into normalized text.
//!
//! Each [`DocumentKind`] owns exactly one extraction strategy, so supporting a new
//! format means adding a variant and its extractor in [`DocumentKind::extract`].

use content_inspector::ContentType;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{IngestError, Result};
use crate::extract::{extract_pdf_text, normalize_whitespace};
use crate::sniff::{classify, DocumentKind};

/// Requirements text ready to hand to the analysis collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementsDocument {
    pub kind: DocumentKind,
    /// Non-empty, whitespace-normalized text.
    pub text: String,
}

impl DocumentKind {
    /// Produce normalized text from `bytes` using this kind's strategy.
    ///
    /// # Errors
    /// - [`IngestError::UnsupportedDocumentType`] for [`DocumentKind::Unsupported`].
    /// - [`IngestError::MalformedDocument`] if a PDF cannot be read.
    pub fn extract(self, bytes: &[u8], filename: &str) -> Result<String> {
        match self {
            DocumentKind::Text => Ok(normalize_whitespace(&decode_text(bytes))),
            DocumentKind::Pdf => extract_pdf_text(bytes),
            DocumentKind::Unsupported => Err(IngestError::UnsupportedDocumentType {
                filename: filename.to_string(),
            }),
        }
    }
}

impl RequirementsDocument {
    /// Sniff and extract an uploaded requirements artifact.
    ///
    /// # Errors
    /// Propagates [`DocumentKind::extract`] failures, and reports an upload with no text
    /// left after normalization as [`IngestError::MalformedDocument`].
    pub fn from_upload(bytes: &[u8], filename: &str) -> Result<Self> {
        let kind = classify(bytes, filename);
        let text = kind.extract(bytes, filename).map_err(|e| {
            error!(filename, ?kind, error = %e, "Failed to extract requirements text");
            e
        })?;
        if text.is_empty() {
            error!(filename, ?kind, "Requirements document contains no text");
            return Err(IngestError::malformed("requirements document contains no text"));
        }
        info!(filename, ?kind, chars = text.len(), "Requirements document ingested");
        Ok(Self { kind, text })
    }
}

/// Decode text bytes, honouring a UTF-8 or UTF-16 byte order mark.
fn decode_text(bytes: &[u8]) -> String {
    match content_inspector::inspect(bytes) {
        ContentType::UTF_8_BOM => String::from_utf8_lossy(&bytes[3..]).into_owned(),
        ContentType::UTF_16LE => decode_utf16(&bytes[2..], u16::from_le_bytes),
        ContentType::UTF_16BE => decode_utf16(&bytes[2..], u16::from_be_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
