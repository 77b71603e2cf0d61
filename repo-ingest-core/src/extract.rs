//! Plain-text extraction from PDF requirements documents.

use lopdf::Document;
use tracing::{debug, error, info};

use crate::error::{IngestError, Result};

/// Collapse every whitespace run (newlines included) to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the text of every page, in page order, and normalize it.
///
/// # Errors
/// [`IngestError::MalformedDocument`] if the bytes are not a parseable PDF, the document
/// has no pages, or any single page's text cannot be extracted. No partial text is
/// returned.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes).map_err(|e| {
        error!(error = ?e, size = bytes.len(), "Failed to parse PDF document");
        IngestError::malformed(format!("not a readable PDF: {e}"))
    })?;

    let pages = document.get_pages();
    if pages.is_empty() {
        error!("PDF document has no pages");
        return Err(IngestError::malformed("PDF document has no pages"));
    }

    let mut raw = String::new();
    for &page_number in pages.keys() {
        let page_text = document.extract_text(&[page_number]).map_err(|e| {
            error!(error = ?e, page = page_number, "Failed to extract text from PDF page");
            IngestError::malformed(format!("cannot extract text from page {page_number}: {e}"))
        })?;
        debug!(page = page_number, chars = page_text.len(), "Extracted PDF page text");
        raw.push_str(&page_text);
    }

    let text = normalize_whitespace(&raw);
    info!(pages = pages.len(), chars = text.len(), "Extracted text from PDF document");
    Ok(text)
}
