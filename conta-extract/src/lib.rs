//! # conta-extract
//!
//! Text extraction for the Conta accounting assistant: converts an
//! uploaded binary (PDF, spreadsheet, plain text) into a UTF-8 text
//! string suitable for chunking and embedding.
//!
//! Extraction is a pure transform over in-memory bytes; callers hand in
//! the payload and its declared MIME type and receive text plus format
//! detail (page count for PDFs, per-sheet blocks for spreadsheets).

mod error;
mod pdf;
mod spreadsheet;

pub use error::{ExtractError, Result};
pub use pdf::{ExtractedText, extract_pdf};
pub use spreadsheet::{SheetBlock, SheetExtraction, extract_spreadsheet};

/// Extract text from a document payload by declared MIME type.
///
/// Handles PDFs (`application/pdf`) and plain-text formats (`text/*`).
/// Spreadsheets go through [`extract_spreadsheet`], which returns richer
/// per-sheet detail.
///
/// # Errors
///
/// Returns [`ExtractError::Unsupported`] for MIME types with no extractor
/// and [`ExtractError::Parse`] when the payload cannot be read as its
/// declared format.
pub fn extract_document(bytes: &[u8], mime: &str) -> Result<ExtractedText> {
    match mime {
        "application/pdf" => extract_pdf(bytes),
        m if m.starts_with("text/") => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            tracing::debug!(mime = m, length = text.len(), "extracted plain text");
            Ok(ExtractedText { text, pages: None })
        }
        other => Err(ExtractError::Unsupported { mime: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let out = extract_document("factura 123\ntotal: $500".as_bytes(), "text/plain").unwrap();
        assert_eq!(out.text, "factura 123\ntotal: $500");
        assert_eq!(out.pages, None);
    }

    #[test]
    fn unknown_mime_is_unsupported() {
        let err = extract_document(b"\x00\x01", "image/png").unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported { .. }));
    }

    #[test]
    fn corrupt_pdf_is_a_parse_error() {
        let err = extract_document(b"definitely not a pdf", "application/pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { format: "pdf", .. }));
    }
}
