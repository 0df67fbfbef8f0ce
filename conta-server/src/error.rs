//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use conta_extract::ExtractError;
use conta_rag::RagError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A multipart request carried no file.
    #[error("missing_file")]
    MissingFile,

    /// Document creation was requested without a title.
    #[error("missing_title")]
    MissingTitle,

    /// An embedding failed validation (length or numeric-ness).
    #[error("invalid_embedding")]
    InvalidEmbedding(String),

    /// Extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// A retrieval-layer failure (store unreachable, bad request).
    #[error(transparent)]
    Rag(RagError),

    /// The outbound webhook call failed or is unconfigured.
    #[error("{0}")]
    Webhook(String),
}

impl From<RagError> for ApiError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::InvalidEmbedding { message } => ApiError::InvalidEmbedding(message),
            other => ApiError::Rag(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "missing_file".to_string()),
            ApiError::MissingTitle => (StatusCode::BAD_REQUEST, "missing_title".to_string()),
            ApiError::InvalidEmbedding(_) => {
                (StatusCode::BAD_REQUEST, "invalid_embedding".to_string())
            }
            ApiError::Extraction(ExtractError::Unsupported { mime }) => {
                (StatusCode::BAD_REQUEST, format!("unsupported_format: {mime}"))
            }
            ApiError::Extraction(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Rag(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Webhook(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
