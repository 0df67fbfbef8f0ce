//! Error types for the `conta-extract` crate.

use thiserror::Error;

/// Errors that can occur while extracting text from an uploaded file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The declared MIME type has no extractor.
    #[error("Unsupported format: {mime}")]
    Unsupported {
        /// The declared MIME type of the payload.
        mime: String,
    },

    /// The payload could not be parsed as its declared format.
    #[error("Extraction failed ({format}): {message}")]
    Parse {
        /// The format whose parser failed.
        format: &'static str,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
