//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] is the exact-scan counterpart of the pgvector
//! backend: a `HashMap` behind a `tokio::sync::RwLock`, suitable for
//! development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{ChunkInsert, Document, Match, UploadMetadata};
use crate::error::{RagError, Result};
use crate::session::cosine_similarity;
use crate::store::{QueryRequest, VectorStore, validate_batch, validate_embedding};

struct StoredDocument {
    document: Document,
    chunks: Vec<ChunkInsert>,
}

/// An in-memory [`VectorStore`] with the same validation and ranking
/// behavior as the persistent backend.
pub struct InMemoryVectorStore {
    dimensions: usize,
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl InMemoryVectorStore {
    /// Create an empty store enforcing the given embedding dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, documents: RwLock::new(HashMap::new()) }
    }

    /// Total number of stored chunks, across all documents.
    pub async fn chunk_count(&self) -> usize {
        self.documents.read().await.values().map(|d| d.chunks.len()).sum()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_document(&self, title: &str, metadata: UploadMetadata) -> Result<Document> {
        let document = Document {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        let mut documents = self.documents.write().await;
        documents.insert(
            document.id.clone(),
            StoredDocument { document: document.clone(), chunks: Vec::new() },
        );
        Ok(document)
    }

    async fn append_chunks(&self, document_id: &str, chunks: &[ChunkInsert]) -> Result<usize> {
        validate_batch(chunks, self.dimensions)?;

        let mut documents = self.documents.write().await;
        let stored = documents.get_mut(document_id).ok_or_else(|| RagError::StoreUnavailable {
            backend: "InMemory".to_string(),
            message: format!("document '{document_id}' does not exist"),
        })?;
        stored.chunks.extend_from_slice(chunks);
        Ok(chunks.len())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<Match>> {
        validate_embedding(&request.embedding, self.dimensions)?;

        let documents = self.documents.read().await;
        let mut matches: Vec<Match> = Vec::new();

        for stored in documents.values() {
            if let Some(scope) = &request.document_id {
                if &stored.document.id != scope {
                    continue;
                }
            }
            for chunk in &stored.chunks {
                let similarity = cosine_similarity(&request.embedding, &chunk.embedding)?;
                if similarity < request.similarity_threshold {
                    continue;
                }
                matches.push(Match {
                    content: chunk.content.clone(),
                    similarity,
                    document_id: stored.document.id.clone(),
                    title: Some(stored.document.title.clone()),
                    metadata: chunk
                        .metadata
                        .clone()
                        .or_else(|| Some(stored.document.metadata.clone())),
                });
            }
        }

        matches.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(request.top_k);
        Ok(matches)
    }
}
