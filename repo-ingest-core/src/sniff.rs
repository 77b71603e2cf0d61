//! Content-type sniffing for uploaded requirements documents.
//!
//! The upload's filename and declared content type are advisory only; the kind is
//! re-derived from the first [`SNIFF_LEN`] bytes. Either signal is enough to accept a
//! document, so a mislabeled upload is still processed.

use std::io::Read;

use content_inspector::ContentType;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::Result;

/// Number of leading bytes inspected by [`classify`].
pub const SNIFF_LEN: usize = 512;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Supported kinds of requirements document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Pdf,
    Unsupported,
}

/// Classify an upload from its leading bytes and its advisory filename.
///
/// Only the first [`SNIFF_LEN`] bytes of `header` are looked at. The content signature
/// takes precedence when content and filename disagree.
pub fn classify(header: &[u8], filename: &str) -> DocumentKind {
    let header = &header[..header.len().min(SNIFF_LEN)];
    let name = filename.to_lowercase();

    let kind = if header.starts_with(PDF_MAGIC) {
        DocumentKind::Pdf
    } else if looks_like_text(header) {
        DocumentKind::Text
    } else if name.ends_with(".pdf") {
        DocumentKind::Pdf
    } else if name.ends_with(".txt") {
        DocumentKind::Text
    } else {
        DocumentKind::Unsupported
    };
    debug!(filename, ?kind, sniffed_bytes = header.len(), "Classified requirements upload");
    kind
}

/// A UTF-16 byte order mark, or UTF-8 free of binary control bytes. A code point cut
/// off at the end of the sniffed window still counts as valid.
fn looks_like_text(header: &[u8]) -> bool {
    let body = match content_inspector::inspect(header) {
        ContentType::UTF_16LE | ContentType::UTF_16BE => return true,
        ContentType::UTF_8 => header,
        ContentType::UTF_8_BOM => &header[3..],
        _ => return false,
    };
    let valid_utf8 = match std::str::from_utf8(body) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    valid_utf8 && !body.iter().copied().any(is_binary_control)
}

/// Control bytes that never occur in plain text (tab, newlines, form feed and escape do).
fn is_binary_control(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Read an upload stream to the end.
///
/// # Errors
/// [`crate::IngestError::Read`] if the stream cannot be read at all.
pub fn read_upload<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        error!(error = ?e, "Failed to read requirements upload");
        e
    })?;
    Ok(bytes)
}
