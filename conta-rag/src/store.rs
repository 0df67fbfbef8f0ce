//! Vector store trait and embedding validation.

use async_trait::async_trait;

use crate::document::{ChunkInsert, Document, Match, UploadMetadata};
use crate::error::{RagError, Result};

/// Parameters for one similarity query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// The query embedding. Must have the store's dimensionality.
    pub embedding: Vec<f32>,
    /// Maximum number of matches to return.
    pub top_k: usize,
    /// Restrict matches to this document, exclusively, when set.
    pub document_id: Option<String>,
    /// Minimum similarity score for a match to be returned.
    pub similarity_threshold: f32,
}

/// A storage backend for documents, chunks, and similarity search.
///
/// Documents are created once and grown by appending chunk batches;
/// chunks are immutable after insertion. Queries rank by cosine
/// similarity descending, optionally scoped to one document and filtered
/// by a similarity threshold.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a document and return it with its assigned id.
    async fn create_document(&self, title: &str, metadata: UploadMetadata) -> Result<Document>;

    /// Append a batch of chunks to an existing document.
    ///
    /// The whole batch is validated before anything is written: every
    /// embedding must have the store's dimensionality and contain only
    /// finite numbers, otherwise the batch is rejected with
    /// [`RagError::InvalidEmbedding`] and nothing is inserted.
    ///
    /// Returns the number of chunks indexed.
    async fn append_chunks(&self, document_id: &str, chunks: &[ChunkInsert]) -> Result<usize>;

    /// Return up to `top_k` matches ranked by similarity descending.
    async fn query(&self, request: &QueryRequest) -> Result<Vec<Match>>;
}

/// Validate one embedding against the expected dimensionality.
///
/// # Errors
///
/// Returns [`RagError::InvalidEmbedding`] on a length mismatch or any
/// non-finite element. Mismatches are a hard error, never a truncation.
pub fn validate_embedding(embedding: &[f32], dimensions: usize) -> Result<()> {
    if embedding.len() != dimensions {
        return Err(RagError::invalid_embedding(format!(
            "expected {dimensions} dimensions, got {}",
            embedding.len()
        )));
    }
    if let Some(position) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(RagError::invalid_embedding(format!(
            "non-finite value at position {position}"
        )));
    }
    Ok(())
}

/// Validate a whole chunk batch; any invalid embedding rejects the batch.
pub fn validate_batch(chunks: &[ChunkInsert], dimensions: usize) -> Result<()> {
    for (index, chunk) in chunks.iter().enumerate() {
        validate_embedding(&chunk.embedding, dimensions).map_err(|e| {
            RagError::invalid_embedding(format!("chunk {index}: {e}"))
        })?;
    }
    Ok(())
}
