use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use conta_rag::{InMemoryVectorStore, PgVectorStore, RagConfig, VectorStore};
use conta_server::{AppState, ServerConfig, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let rag = RagConfig::default();

    let store: Arc<dyn VectorStore> = match &config.database_url {
        Some(url) => {
            let store = PgVectorStore::connect(url, rag.dimensions).await?;
            store.ensure_schema().await?;
            info!("using pgvector store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store (data will not persist)");
            Arc::new(InMemoryVectorStore::new(rag.dimensions))
        }
    };

    let state = AppState::new(store, rag, config.webhooks.clone());
    run_server(state, &config.host, config.port).await
}
