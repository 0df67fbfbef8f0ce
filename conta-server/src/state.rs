//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use conta_rag::{RagConfig, VectorStore};

use crate::config::WebhookConfig;

/// Outbound webhook calls must not hang a request indefinitely.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The vector store backing ingest and query.
    pub store: Arc<dyn VectorStore>,
    /// Retrieval tunables (dimensionality, top-k bounds, threshold).
    pub rag: RagConfig,
    /// Outbound HTTP client for webhook forwarding.
    pub http: reqwest::Client,
    /// Configured webhook endpoints.
    pub webhooks: WebhookConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn VectorStore>, rag: RagConfig, webhooks: WebhookConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { store, rag, http, webhooks }
    }
}
