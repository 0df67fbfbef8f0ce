//! Gemini embedding provider using the Generative Language REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL of the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-004";

/// The dimensionality of `text-embedding-004` vectors.
const DEFAULT_DIMENSIONS: usize = 768;

/// Default per-request timeout; a hung embedding call must not stall a
/// chat turn past this.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Single texts are embedded with the `RETRIEVAL_QUERY` task type, batches
/// with `RETRIEVAL_DOCUMENT`, matching how queries and document chunks are
/// used downstream.
///
/// # Example
///
/// ```rust,ignore
/// use conta_rag::GeminiEmbedder;
///
/// let embedder = GeminiEmbedder::new(api_key)?;
/// let vector = embedder.embed("saldo de la factura 42").await?;
/// assert_eq!(vector.len(), 768);
/// ```
#[derive(Debug)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Create a new provider with the given API key and the default
    /// `text-embedding-004` model (768 dimensions).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RagError::Embedding {
                provider: "Gemini".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the expected output dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn transport_err(&self, message: String) -> RagError {
        RagError::Embedding { provider: "Gemini".into(), message }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        error!(provider = "Gemini", %status, "embedding API error");
        Err(self.transport_err(format!("API returned {status}: {detail}")))
    }

    /// Reject vectors whose length differs from the configured
    /// dimensionality; a silently shorter vector would poison the store.
    fn check_dimensions(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.dimensions {
            return Err(self.transport_err(format!(
                "API returned a {}-dimensional vector, expected {}",
                values.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ContentPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding query text");

        let url = format!("{GEMINI_BASE_URL}/models/{}:embedContent", self.model);
        let body = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content { parts: vec![ContentPart { text }] },
            task_type: "RETRIEVAL_QUERY",
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "embedding request failed");
                self.transport_err(format!("request failed: {e}"))
            })?;
        let response = self.check_status(response).await?;

        let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse embedding response");
            self.transport_err(format!("failed to parse response: {e}"))
        })?;

        self.check_dimensions(&parsed.embedding.values)?;
        Ok(parsed.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), model = %self.model, "embedding batch");

        let url = format!("{GEMINI_BASE_URL}/models/{}:batchEmbedContents", self.model);
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{}", self.model),
                    content: Content { parts: vec![ContentPart { text }] },
                    task_type: "RETRIEVAL_DOCUMENT",
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "batch embedding request failed");
                self.transport_err(format!("request failed: {e}"))
            })?;
        let response = self.check_status(response).await?;

        let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse batch response");
            self.transport_err(format!("failed to parse response: {e}"))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(self.transport_err(format!(
                "API returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        for embedding in &parsed.embeddings {
            self.check_dimensions(&embedding.values)?;
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
