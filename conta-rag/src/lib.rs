//! # conta-rag
//!
//! Retrieval-augmented generation core for the Conta accounting
//! assistant: chunking, embedding, vector storage, local similarity
//! search over session documents, and the retrieval orchestration that
//! grounds generated answers in uploaded documents with enforced
//! citations.
//!
//! ## Overview
//!
//! - [`Chunker`] / [`RecursiveChunker`] — split extracted text into
//!   overlapping, embeddable chunks at natural boundaries
//! - [`EmbeddingProvider`] / [`GeminiEmbedder`] — map text to fixed-length
//!   vectors (768 for `text-embedding-004`)
//! - [`VectorStore`] / [`PgVectorStore`] / [`InMemoryVectorStore`] —
//!   document + chunk persistence with cosine similarity queries
//! - [`SessionContext`] — ephemeral per-session documents searched with a
//!   brute-force cosine scan
//! - [`RetrievalOrchestrator`] — embed → search → ground → cite, with a
//!   bounded citation-repair retry and graceful fallback to direct chat

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod inmemory;
pub mod pgvector;
pub mod retrieval;
pub mod session;
pub mod store;

pub use chunking::{Chunker, RecursiveChunker, TextChunk};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChunkInsert, Document, Match, UploadMetadata};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gemini::GeminiEmbedder;
pub use inmemory::InMemoryVectorStore;
pub use pgvector::PgVectorStore;
pub use retrieval::{
    CITATION_MARKER, CitationPolicy, RetrievalOrchestrator, RetrievalOrchestratorBuilder,
    RetrievalOutcome, RetrievalScope, format_context, has_citation, needs_retrieval,
};
pub use session::{SessionChunk, SessionContext, SessionDocument, cosine_similarity};
pub use store::{QueryRequest, VectorStore, validate_batch, validate_embedding};
