//! Router tests for the ingest/query/extract contracts, driven through
//! `tower::ServiceExt::oneshot` against the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use serde_json::{Value, json};
use tower::ServiceExt;

use conta_rag::{InMemoryVectorStore, RagConfig};
use conta_server::{AppState, WebhookConfig, app_router};

const DIM: usize = 768;

fn test_app() -> Router {
    let rag = RagConfig::default();
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    app_router(AppState::new(store, rag, WebhookConfig::default()))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn embedding(hot: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[hot] = 1.0;
    v
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn document_creation_requires_a_title() {
    let app = test_app();
    let (status, body) = post_json(&app, "/api/rag/ingest", json!({"metadata": {}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_title");
}

#[tokio::test]
async fn ingest_then_scoped_query_round_trips() {
    let app = test_app();

    let (status, created) = post_json(
        &app,
        "/api/rag/ingest",
        json!({
            "title": "Test Invoice",
            "metadata": {"filename": "invoice.pdf", "type": "application/pdf"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let document_id = created["document_id"].as_str().unwrap().to_string();
    assert_eq!(created["indexed_count"], 0);

    let chunks: Vec<Value> = (0..3)
        .map(|i| json!({"content": format!("chunk {i}"), "embedding": embedding(i)}))
        .collect();
    let (status, indexed) = post_json(
        &app,
        "/api/rag/ingest",
        json!({"document_id": document_id, "chunks": chunks}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(indexed["indexed_count"], 3);

    let mut query = vec![0.0f32; DIM];
    query[0] = 1.0;
    query[1] = 0.4;
    let (status, result) = post_json(
        &app,
        "/api/rag/query",
        json!({
            "embedding": query,
            "top_k": 2,
            "document_id": document_id,
            "similarity_threshold": 0.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let matches = result["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["content"], "chunk 0");
    assert!(matches.iter().all(|m| m["document_id"] == json!(document_id)));
    assert!(
        matches[0]["similarity"].as_f64().unwrap() >= matches[1]["similarity"].as_f64().unwrap()
    );
}

#[tokio::test]
async fn wrong_dimensionality_rejects_the_whole_batch() {
    let app = test_app();

    let (_, created) = post_json(&app, "/api/rag/ingest", json!({"title": "Doc"})).await;
    let document_id = created["document_id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/api/rag/ingest",
        json!({
            "document_id": document_id,
            "chunks": [
                {"content": "ok", "embedding": embedding(0)},
                {"content": "bad", "embedding": [0.1, 0.2, 0.3]}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_embedding");

    // Nothing was stored: a scoped query at threshold -1 finds no chunks.
    let (status, result) = post_json(
        &app,
        "/api/rag/query",
        json!({"embedding": embedding(0), "document_id": document_id, "similarity_threshold": -1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["matches"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn short_query_embedding_is_rejected() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/api/rag/query",
        json!({"embedding": [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_embedding");
}

#[tokio::test]
async fn non_numeric_query_embedding_is_rejected() {
    let app = test_app();
    let (status, body) =
        post_json(&app, "/api/rag/query", json!({"embedding": ["no", "numeros"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_embedding");
}

#[tokio::test]
async fn unknown_top_k_falls_back_to_the_default() {
    let app = test_app();

    let (_, created) = post_json(&app, "/api/rag/ingest", json!({"title": "Doc"})).await;
    let document_id = created["document_id"].as_str().unwrap().to_string();
    let chunks: Vec<Value> = (0..8)
        .map(|i| json!({"content": format!("c{i}"), "embedding": embedding(0)}))
        .collect();
    post_json(&app, "/api/rag/ingest", json!({"document_id": document_id, "chunks": chunks}))
        .await;

    // top_k of 0 is out of bounds; the default of 5 applies.
    let (status, result) = post_json(
        &app,
        "/api/rag/query",
        json!({"embedding": embedding(0), "top_k": 0, "similarity_threshold": 0.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["matches"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn extract_without_a_file_is_a_400() {
    let app = test_app();

    let boundary = "X-CONTA-TEST-BOUNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalor\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/rag/extract")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["error"], "missing_file");
}

#[tokio::test]
async fn unconfigured_webhook_is_a_500() {
    let app = test_app();
    let (status, _) = post_json(&app, "/api/trigger/accounting", json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
