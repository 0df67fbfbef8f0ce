//! Error types for the `conta-core` crate.

use thiserror::Error;

/// Errors that can occur in core conversation and generation operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A chat/completion call to the generation backend failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A request was malformed before reaching any backend.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
