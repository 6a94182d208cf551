//! PDF text extraction.

use lopdf::Document;

use crate::error::ExtractError;

/// Extract the text layer of a PDF held in memory.
///
/// Within a page, text runs are joined with single spaces; pages are
/// joined with newlines. Scanned PDFs without a text layer yield an
/// empty string.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes)?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        let raw = document.extract_text(&[*page_number])?;
        pages.push(raw.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    tracing::debug!(pages = pages.len(), "PDF text extracted");
    Ok(pages.join("\n").trim().to_string())
}
