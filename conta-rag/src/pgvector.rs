//! Persistent vector store on PostgreSQL with the pgvector extension.
//!
//! Documents live in a `documents` table, chunks in a `chunks` table with
//! a `vector(N)` column. Similarity queries run server-side with the
//! cosine distance operator `<=>`; scores are `1 - distance`.
//!
//! # Prerequisites
//!
//! - PostgreSQL with the `pgvector` extension available
//! - [`PgVectorStore::ensure_schema`] creates the extension and tables

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::document::{ChunkInsert, Document, Match, UploadMetadata};
use crate::error::{RagError, Result};
use crate::store::{QueryRequest, VectorStore, validate_batch, validate_embedding};

/// A [`VectorStore`] backed by PostgreSQL + pgvector.
pub struct PgVectorStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgVectorStore {
    /// Connect to the given database URL.
    pub async fn connect(database_url: &str, dimensions: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        Ok(Self { pool, dimensions })
    }

    /// Wrap an existing connection pool.
    pub fn from_pool(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::StoreUnavailable { backend: "pgvector".to_string(), message: e.to_string() }
    }

    /// Create the pgvector extension and the `documents`/`chunks` tables
    /// if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (\
                id TEXT PRIMARY KEY, \
                title TEXT NOT NULL, \
                metadata JSONB NOT NULL DEFAULT '{}'::jsonb, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let create_chunks = format!(
            "CREATE TABLE IF NOT EXISTS chunks (\
                id BIGSERIAL PRIMARY KEY, \
                document_id TEXT NOT NULL REFERENCES documents(id), \
                content TEXT NOT NULL, \
                embedding vector({}) NOT NULL, \
                metadata JSONB\
            )",
            self.dimensions
        );
        sqlx::query(&create_chunks).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(dimensions = self.dimensions, "pgvector schema ready");
        Ok(())
    }

    /// pgvector expects vectors rendered as `'[v1,v2,...]'`.
    fn embedding_literal(embedding: &[f32]) -> String {
        format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn create_document(&self, title: &str, metadata: UploadMetadata) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        let metadata_json = serde_json::to_value(&metadata)
            .map_err(|e| RagError::Retrieval(format!("metadata serialization failed: {e}")))?;

        let row = sqlx::query(
            "INSERT INTO documents (id, title, metadata) VALUES ($1, $2, $3) \
             RETURNING created_at",
        )
        .bind(&id)
        .bind(title)
        .bind(&metadata_json)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let created_at: DateTime<Utc> = row.get("created_at");
        debug!(document_id = %id, title, "document created");

        Ok(Document { id, title: title.to_string(), metadata, created_at })
    }

    async fn append_chunks(&self, document_id: &str, chunks: &[ChunkInsert]) -> Result<usize> {
        // Whole-batch validation before touching the database.
        validate_batch(chunks, self.dimensions)?;
        if chunks.is_empty() {
            return Ok(0);
        }

        // One transaction per batch: either every chunk lands or none does.
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        for chunk in chunks {
            let metadata_json = chunk
                .metadata
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| RagError::Retrieval(format!("metadata serialization failed: {e}")))?;

            sqlx::query(
                "INSERT INTO chunks (document_id, content, embedding, metadata) \
                 VALUES ($1, $2, $3::vector, $4)",
            )
            .bind(document_id)
            .bind(&chunk.content)
            .bind(Self::embedding_literal(&chunk.embedding))
            .bind(metadata_json)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }

        tx.commit().await.map_err(Self::map_err)?;

        debug!(document_id, count = chunks.len(), "chunks appended");
        Ok(chunks.len())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<Match>> {
        validate_embedding(&request.embedding, self.dimensions)?;

        let rows = sqlx::query(
            "SELECT c.content, c.document_id, c.metadata, d.title, \
                    1 - (c.embedding <=> $1::vector) AS score \
             FROM chunks c \
             JOIN documents d ON d.id = c.document_id \
             WHERE ($2::text IS NULL OR c.document_id = $2) \
               AND 1 - (c.embedding <=> $1::vector) >= $3 \
             ORDER BY c.embedding <=> $1::vector \
             LIMIT $4",
        )
        .bind(Self::embedding_literal(&request.embedding))
        .bind(request.document_id.as_deref())
        .bind(request.similarity_threshold as f64)
        .bind(request.top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let matches = rows
            .iter()
            .map(|row| {
                let score: f64 = row.get("score");
                let metadata: Option<serde_json::Value> = row.get("metadata");
                Match {
                    content: row.get("content"),
                    similarity: score as f32,
                    document_id: row.get("document_id"),
                    title: Some(row.get("title")),
                    metadata: metadata.and_then(|m| serde_json::from_value(m).ok()),
                }
            })
            .collect();

        Ok(matches)
    }
}
