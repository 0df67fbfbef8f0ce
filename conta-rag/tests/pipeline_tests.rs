//! End-to-end tests of ingestion, querying, and the citation-repair
//! policy, using the in-memory store and scripted test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use conta_core::{ConversationState, CoreError, GenerationConfig, Llm, Message};
use conta_rag::chunking::RecursiveChunker;
use conta_rag::config::RagConfig;
use conta_rag::document::{ChunkInsert, UploadMetadata};
use conta_rag::embedding::EmbeddingProvider;
use conta_rag::error::RagError;
use conta_rag::inmemory::InMemoryVectorStore;
use conta_rag::retrieval::{RetrievalOrchestrator, RetrievalOutcome, RetrievalScope};
use conta_rag::store::{QueryRequest, VectorStore};

const DIM: usize = 768;

/// Deterministic embedder: hashes the text into a sparse one-hot-ish
/// vector so distinct texts get distinct directions.
struct HashingEmbedder;

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> conta_rag::Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIM];
        let mut h: usize = 5381;
        for b in text.bytes() {
            h = h.wrapping_mul(33).wrapping_add(b as usize);
        }
        v[h % DIM] = 1.0;
        v[(h / DIM) % DIM] = 0.5;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// An embedder that always fails, for exercising the fallback path.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> conta_rag::Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "test".into(), message: "boom".into() })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// An LLM that replays a fixed script of replies and records every call.
struct ScriptedLlm {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> conta_core::Result<String> {
        self.calls.lock().await.push(messages.to_vec());
        self.replies.lock().await.pop().ok_or_else(|| CoreError::Generation {
            provider: "scripted".into(),
            message: "script exhausted".into(),
        })
    }
}

fn unit_vector(hot: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[hot] = 1.0;
    v
}

fn orchestrator(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
) -> RetrievalOrchestrator {
    RetrievalOrchestrator::builder()
        .config(RagConfig::default())
        .embedder(embedder)
        .store(store)
        .chunker(Arc::new(RecursiveChunker::new(1200, 200)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn ingest_then_scoped_query_returns_ranked_matches() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));

    let doc = store
        .create_document(
            "Test Invoice",
            UploadMetadata { filename: Some("invoice.pdf".into()), ..Default::default() },
        )
        .await
        .unwrap();

    let chunks = vec![
        ChunkInsert { content: "total 1500".into(), embedding: unit_vector(0), metadata: None },
        ChunkInsert { content: "iva 240".into(), embedding: unit_vector(1), metadata: None },
        ChunkInsert { content: "fecha marzo".into(), embedding: unit_vector(2), metadata: None },
    ];
    let indexed = store.append_chunks(&doc.id, &chunks).await.unwrap();
    assert_eq!(indexed, 3);

    // A query vector near chunk 0: scoped, top 2, descending.
    let mut query = vec![0.0f32; DIM];
    query[0] = 1.0;
    query[1] = 0.3;

    let matches = store
        .query(&QueryRequest {
            embedding: query,
            top_k: 2,
            document_id: Some(doc.id.clone()),
            similarity_threshold: 0.0,
        })
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.document_id == doc.id));
    assert!(matches[0].similarity >= matches[1].similarity);
    assert_eq!(matches[0].content, "total 1500");
}

#[tokio::test]
async fn short_query_vector_is_rejected_without_partial_results() {
    let store = InMemoryVectorStore::new(DIM);
    let doc = store.create_document("Doc", UploadMetadata::default()).await.unwrap();
    store
        .append_chunks(
            &doc.id,
            &[ChunkInsert { content: "x".into(), embedding: unit_vector(0), metadata: None }],
        )
        .await
        .unwrap();

    let err = store
        .query(&QueryRequest {
            embedding: vec![0.1; 10],
            top_k: 5,
            document_id: None,
            similarity_threshold: 0.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidEmbedding { .. }));
}

#[tokio::test]
async fn invalid_batch_leaves_the_store_unchanged() {
    let store = InMemoryVectorStore::new(DIM);
    let doc = store.create_document("Doc", UploadMetadata::default()).await.unwrap();

    let batch = vec![
        ChunkInsert { content: "ok".into(), embedding: unit_vector(0), metadata: None },
        ChunkInsert { content: "bad".into(), embedding: vec![0.1; 10], metadata: None },
    ];
    let err = store.append_chunks(&doc.id, &batch).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidEmbedding { .. }));
    assert_eq!(store.chunk_count().await, 0);
}

#[tokio::test]
async fn ingest_text_chunks_embeds_and_counts() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let orch = orchestrator(Arc::new(HashingEmbedder), store.clone());

    let text = "Registro de gastos de marzo. ".repeat(100);
    let (document, indexed) =
        orch.ingest_text("Gastos marzo", UploadMetadata::default(), &text).await.unwrap();

    assert!(indexed > 1);
    assert_eq!(store.chunk_count().await, indexed);
    assert_eq!(document.title, "Gastos marzo");
}

#[tokio::test]
async fn missing_citation_triggers_exactly_one_retry() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let doc = store.create_document("Facturas", UploadMetadata::default()).await.unwrap();
    // Store a chunk the hashing embedder will rank close to any query.
    let embedded = HashingEmbedder.embed("la factura de marzo").await.unwrap();
    store
        .append_chunks(
            &doc.id,
            &[ChunkInsert { content: "total: $1500".into(), embedding: embedded, metadata: None }],
        )
        .await
        .unwrap();

    let orch = RetrievalOrchestrator::builder()
        .config(
            RagConfig::builder().similarity_threshold(-1.0).build().unwrap(),
        )
        .embedder(Arc::new(HashingEmbedder))
        .store(store)
        .chunker(Arc::new(RecursiveChunker::new(1200, 200)))
        .build()
        .unwrap();

    // First reply lacks the marker; the retry still lacks it and must be
    // accepted as-is.
    let llm =
        ScriptedLlm::new(vec!["respuesta sin citas", "sigo sin citar, pero soy la definitiva"]);
    let state = ConversationState::with_system("persona");

    let outcome = orch
        .answer(
            &llm,
            &GenerationConfig::default(),
            &state,
            "cuál es el total de la factura de marzo",
            &[],
            RetrievalScope::Store { document_id: None },
        )
        .await;

    match outcome {
        RetrievalOutcome::Grounded { reply, attempts, .. } => {
            assert_eq!(attempts, 2);
            assert_eq!(reply, "sigo sin citar, pero soy la definitiva");
        }
        RetrievalOutcome::Fallback { reason } => panic!("unexpected fallback: {reason}"),
    }
    assert_eq!(llm.call_count().await, 2);
}

#[tokio::test]
async fn compliant_reply_is_not_retried() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let doc = store.create_document("Facturas", UploadMetadata::default()).await.unwrap();
    let embedded = HashingEmbedder.embed("factura").await.unwrap();
    store
        .append_chunks(
            &doc.id,
            &[ChunkInsert { content: "total: $1500".into(), embedding: embedded, metadata: None }],
        )
        .await
        .unwrap();

    let orch = RetrievalOrchestrator::builder()
        .config(RagConfig::builder().similarity_threshold(-1.0).build().unwrap())
        .embedder(Arc::new(HashingEmbedder))
        .store(store)
        .chunker(Arc::new(RecursiveChunker::new(1200, 200)))
        .build()
        .unwrap();

    let llm = ScriptedLlm::new(vec!["El total es $1500.\nFragmentos usados: 1"]);
    let state = ConversationState::with_system("persona");

    let outcome = orch
        .answer(
            &llm,
            &GenerationConfig::default(),
            &state,
            "cuál es el total de la factura",
            &[],
            RetrievalScope::Store { document_id: None },
        )
        .await;

    match outcome {
        RetrievalOutcome::Grounded { attempts, .. } => assert_eq!(attempts, 1),
        RetrievalOutcome::Fallback { reason } => panic!("unexpected fallback: {reason}"),
    }
    assert_eq!(llm.call_count().await, 1);
}

#[tokio::test]
async fn embedding_failure_degrades_to_fallback() {
    let store = Arc::new(InMemoryVectorStore::new(DIM));
    let orch = orchestrator(Arc::new(FailingEmbedder), store);

    let llm = ScriptedLlm::new(vec![]);
    let state = ConversationState::with_system("persona");

    let outcome = orch
        .answer(
            &llm,
            &GenerationConfig::default(),
            &state,
            "qué dice la factura de marzo",
            &[],
            RetrievalScope::Store { document_id: None },
        )
        .await;

    assert!(matches!(outcome, RetrievalOutcome::Fallback { .. }));
    // The generator was never invoked on the grounded path.
    assert_eq!(llm.call_count().await, 0);
}
