//! Router construction and server startup.

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Uploads (PDFs, workbooks, forwarded files) can be well past axum's
/// 2 MB default.
const BODY_LIMIT: usize = 25 * 1024 * 1024;

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/rag/ingest", post(handlers::rag::ingest))
        .route("/api/rag/query", post(handlers::rag::query))
        .route("/api/rag/extract", post(handlers::rag::extract))
        .route("/api/excel/extract", post(handlers::excel::extract))
        .route("/api/trigger/accounting", post(handlers::triggers::accounting))
        .route("/api/trigger/gastos", post(handlers::triggers::gastos))
        .route("/api/trigger/ingresos", post(handlers::triggers::ingresos))
        .route("/api/upload", post(handlers::triggers::upload_to_drive))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
}

pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| "invalid host/port for conta-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("conta-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "service": "conta-server"}))
}
