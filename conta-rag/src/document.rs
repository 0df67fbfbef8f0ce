//! Data types for documents, chunks, and query matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured metadata recorded with an uploaded document.
///
/// All fields are optional; chunks without their own metadata inherit the
/// parent document's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Original filename of the upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Size of the upload in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Declared MIME type of the upload.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Name of the embedding model the chunks were embedded with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

/// A persisted source document. Immutable once created except by
/// appending chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier, assigned at creation.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Structured upload metadata.
    #[serde(default)]
    pub metadata: UploadMetadata,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A chunk submitted for ingestion: content plus its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkInsert {
    /// Raw text content of the chunk.
    pub content: String,
    /// Embedding vector; must have the store's configured dimensionality.
    pub embedding: Vec<f32>,
    /// Chunk-level metadata; inherits the document's when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UploadMetadata>,
}

/// A transient query result: never persisted, recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// The matched chunk's text content.
    pub content: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
    /// The source document's id.
    pub document_id: String,
    /// The source document's title, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Metadata carried by the matched chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UploadMetadata>,
}
