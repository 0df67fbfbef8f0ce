//! Error types for the `conta-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// There was nothing to chunk or embed.
    #[error("Empty input: nothing to chunk or embed")]
    EmptyInput,

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding failed validation at the store boundary.
    #[error("Invalid embedding: {message}")]
    InvalidEmbedding {
        /// What was wrong with the vector.
        message: String,
    },

    /// Two vectors of unequal length were compared.
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the left-hand vector.
        left: usize,
        /// Length of the right-hand vector.
        right: usize,
    },

    /// The backing vector store could not be reached.
    #[error("Vector store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in retrieval orchestration.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// An error propagated from the generation backend.
    #[error(transparent)]
    Generation(#[from] conta_core::CoreError),
}

impl RagError {
    /// Shorthand for an [`RagError::InvalidEmbedding`] with a formatted message.
    pub fn invalid_embedding(message: impl Into<String>) -> Self {
        Self::InvalidEmbedding { message: message.into() }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
