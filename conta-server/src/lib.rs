//! # conta-server
//!
//! HTTP surface for the Conta accounting assistant: document ingestion
//! and similarity queries against the vector store, file text
//! extraction, and outbound webhook triggers for the automation tool.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ServerConfig, WebhookConfig};
pub use error::ApiError;
pub use routes::{app_router, run_server};
pub use state::AppState;
