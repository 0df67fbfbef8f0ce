//! PDF text extraction.

use crate::error::{ExtractError, Result};

/// Extracted document text with optional pagination detail.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExtractedText {
    /// The full extracted text (possibly empty).
    pub text: String,
    /// Page count, when the format is paginated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

/// Extract text and page count from an in-memory PDF.
///
/// Text comes from `pdf-extract`; the page count from `lopdf`, which
/// parses the page tree without rendering. A payload `pdf-extract` can
/// read but `lopdf` cannot still succeeds, with `pages: None`.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText> {
    tracing::debug!(size = bytes.len(), "extracting pdf");

    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        tracing::error!(error = %e, "pdf extraction failed");
        ExtractError::Parse { format: "pdf", message: e.to_string() }
    })?;

    let pages = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            tracing::warn!(error = %e, "page count unavailable");
            None
        }
    };

    tracing::debug!(length = text.len(), ?pages, "pdf extracted");
    Ok(ExtractedText { text, pages })
}
