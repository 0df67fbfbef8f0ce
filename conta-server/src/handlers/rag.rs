//! Ingest, query, and document-extraction handlers.
//!
//! Request bodies are parsed from raw JSON so that malformed embeddings
//! come back as 400 `invalid_embedding` rather than a generic
//! deserialization rejection — the store contract is the visible one.

use axum::Json;
use axum::extract::{Multipart, State};
use serde_json::Value;
use tracing::info;

use conta_extract::{ExtractedText, extract_document};
use conta_rag::store::QueryRequest;
use conta_rag::{ChunkInsert, Match, UploadMetadata, validate_embedding};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(serde::Serialize)]
pub struct IngestResponse {
    pub document_id: String,
    pub indexed_count: usize,
}

/// `POST /api/rag/ingest`
///
/// Two forms: `{title, metadata}` creates a document and returns its id;
/// `{document_id, chunks}` appends a validated chunk batch. Both may be
/// combined in one call.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<IngestResponse>, ApiError> {
    let document_id = match body.get("document_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let title = body
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .ok_or(ApiError::MissingTitle)?;
            let metadata: UploadMetadata = body
                .get("metadata")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .unwrap_or_default()
                .unwrap_or_default();

            let document = state.store.create_document(title, metadata).await?;
            info!(document_id = %document.id, title, "document created");
            document.id
        }
    };

    let chunks: Vec<ChunkInsert> = match body.get("chunks") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| ApiError::InvalidEmbedding(e.to_string()))?,
    };

    let indexed_count = if chunks.is_empty() {
        0
    } else {
        let count = state.store.append_chunks(&document_id, &chunks).await?;
        info!(%document_id, count, "chunks indexed");
        count
    };

    Ok(Json(IngestResponse { document_id, indexed_count }))
}

#[derive(serde::Serialize)]
pub struct QueryResponse {
    pub matches: Vec<Match>,
}

/// `POST /api/rag/query`
///
/// `{embedding, top_k?, document_id?, similarity_threshold?}`; the
/// embedding must be 768 finite numbers, `top_k` is clamped to its
/// configured bounds, and the threshold defaults to the configured value.
pub async fn query(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<QueryResponse>, ApiError> {
    let embedding: Vec<f32> = body
        .get("embedding")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ApiError::InvalidEmbedding(e.to_string()))?
        .unwrap_or_default();
    validate_embedding(&embedding, state.rag.dimensions)?;

    let top_k = state.rag.clamp_top_k(
        body.get("top_k").and_then(Value::as_u64).map(|k| k as usize),
    );
    let similarity_threshold = body
        .get("similarity_threshold")
        .and_then(Value::as_f64)
        .map(|t| t as f32)
        .unwrap_or(state.rag.similarity_threshold);
    let document_id = body.get("document_id").and_then(Value::as_str).map(str::to_string);

    let matches = state
        .store
        .query(&QueryRequest { embedding, top_k, document_id, similarity_threshold })
        .await?;

    info!(count = matches.len(), "query completed");
    Ok(Json(QueryResponse { matches }))
}

/// `POST /api/rag/extract`
///
/// Multipart upload of one document file; returns `{text, pages?}`.
pub async fn extract(mut multipart: Multipart) -> Result<Json<ExtractedText>, ApiError> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|_| ApiError::MissingFile)? {
        if field.name() == Some("file") {
            let mime = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/pdf".to_string());
            let bytes = field.bytes().await.map_err(|_| ApiError::MissingFile)?;
            upload = Some((bytes.to_vec(), mime));
        }
    }

    let (bytes, mime) = upload.ok_or(ApiError::MissingFile)?;
    info!(size = bytes.len(), %mime, "extracting uploaded document");

    let extracted = extract_document(&bytes, &mime)?;
    Ok(Json(extracted))
}
