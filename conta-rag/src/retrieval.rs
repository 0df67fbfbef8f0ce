//! Retrieval orchestration: decide, retrieve, ground, cite.
//!
//! [`RetrievalOrchestrator`] coordinates the grounded-answer path: embed
//! the question, query the persistent store or the session set, assemble
//! an enumerated context block, and require the generator to cite which
//! fragments it used — with a single corrective retry when the citation
//! line is missing. Every failure along the way resolves to
//! [`RetrievalOutcome::Fallback`], so retrieval degrades to direct chat
//! instead of failing the user's turn.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};

use conta_core::{ConversationState, GenerationConfig, Llm, Message};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{ChunkInsert, Document, Match, UploadMetadata};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::session::SessionContext;
use crate::store::{QueryRequest, VectorStore};

/// The line every grounded reply must carry, enumerating the fragment
/// indices it drew from.
pub const CITATION_MARKER: &str = "Fragmentos usados";

/// Inputs shorter than this many words never trigger retrieval.
const MIN_RETRIEVAL_WORDS: usize = 4;

/// Inputs longer than this many characters trigger retrieval even
/// without document-reference vocabulary.
const LONG_INPUT_CHARS: usize = 200;

/// Chunks taken per session document before merging across documents.
const SESSION_PER_DOCUMENT_K: usize = 3;

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hola|hello|hi|buenas|buenos dias|buenos días|buenas tardes|buenas noches|que tal|qué tal)[\s!¡.,]*$")
        .expect("greeting pattern is valid")
});

static DOCUMENT_VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(facturas?|recibos?|comprobantes?|documentos?|p[aá]ginas?|tablas?|hojas?|estado de cuenta|estados de cuenta|extractos?|anexos?|archivos?|pdf|excel)\b",
    )
    .expect("document vocabulary pattern is valid")
});

/// Decide whether a user message warrants retrieval.
///
/// Greetings and very short inputs skip it; document-reference
/// vocabulary or a long input triggers it; anything else is direct chat.
pub fn needs_retrieval(text: &str) -> bool {
    let trimmed = text.trim();
    if GREETING.is_match(trimmed) {
        return false;
    }
    if trimmed.split_whitespace().count() < MIN_RETRIEVAL_WORDS {
        return false;
    }
    DOCUMENT_VOCABULARY.is_match(trimmed) || trimmed.chars().count() > LONG_INPUT_CHARS
}

/// Format matches as an enumerated context block, one fragment per match.
pub fn format_context(matches: &[Match]) -> String {
    let fragments: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let header = match &m.title {
                Some(title) => {
                    format!("Fragmento {} ({}, similitud: {:.3})", i + 1, title, m.similarity)
                }
                None => format!("Fragmento {} (similitud: {:.3})", i + 1, m.similarity),
            };
            format!("{header}:\n{}", m.content)
        })
        .collect();
    fragments.join("\n\n")
}

/// Whether a reply carries the citation line.
pub fn has_citation(reply: &str) -> bool {
    reply.to_lowercase().contains(&CITATION_MARKER.to_lowercase())
}

/// Bounded retry policy for the citation check: one corrective follow-up,
/// then accept whatever the retry produces.
#[derive(Debug, Clone)]
pub struct CitationPolicy {
    /// Total generation attempts allowed, the first one included.
    pub max_attempts: u32,
}

impl Default for CitationPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

/// Where a grounded answer draws its fragments from.
pub enum RetrievalScope<'a> {
    /// The persistent vector store, optionally scoped to one document.
    Store { document_id: Option<&'a str> },
    /// The session's ephemeral document set.
    Session(&'a SessionContext),
}

/// The resolution of one grounded-answer attempt.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// Retrieval and generation succeeded.
    Grounded {
        /// The generated reply (citation line included when the model
        /// complied within the retry budget).
        reply: String,
        /// The fragments the reply was grounded on.
        matches: Vec<Match>,
        /// How many generation attempts were used (1 or 2).
        attempts: u32,
    },
    /// The grounded path failed; the caller should answer with direct
    /// chat instead.
    Fallback {
        /// Why the grounded path was abandoned.
        reason: String,
    },
}

/// Coordinates embed → search → ground → cite, plus text ingestion.
///
/// Construct one via [`RetrievalOrchestrator::builder()`].
pub struct RetrievalOrchestrator {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    citation: CitationPolicy,
}

impl RetrievalOrchestrator {
    /// Create a new [`RetrievalOrchestratorBuilder`].
    pub fn builder() -> RetrievalOrchestratorBuilder {
        RetrievalOrchestratorBuilder::default()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest a text as a new document: chunk, embed per batch, append.
    ///
    /// Batches are independent and idempotent to retry: if a batch fails,
    /// the document id remains usable for a later attempt.
    ///
    /// # Errors
    ///
    /// Returns the first chunking, embedding, or store error. Ingestion
    /// errors are surfaced, not swallowed — adding a document is an
    /// intentional action the user can inspect and retry.
    pub async fn ingest_text(
        &self,
        title: &str,
        metadata: UploadMetadata,
        text: &str,
    ) -> Result<(Document, usize)> {
        let chunks = self.chunker.chunk(text)?;
        let document = self.store.create_document(title, metadata).await?;

        let mut indexed = 0;
        for batch in chunks.chunks(self.config.ingest_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let inserts: Vec<ChunkInsert> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| ChunkInsert {
                    content: chunk.text.clone(),
                    embedding,
                    metadata: None,
                })
                .collect();

            indexed += self.store.append_chunks(&document.id, &inserts).await?;
        }

        info!(document_id = %document.id, chunk_count = indexed, "ingested document");
        Ok((document, indexed))
    }

    /// Retrieve the top fragments for a question within the given scope.
    pub async fn retrieve(
        &self,
        question: &str,
        scope: &RetrievalScope<'_>,
    ) -> Result<Vec<Match>> {
        let query_embedding = self.embedder.embed(question).await?;

        match scope {
            RetrievalScope::Store { document_id } => {
                self.store
                    .query(&QueryRequest {
                        embedding: query_embedding,
                        top_k: self.config.top_k,
                        document_id: document_id.map(str::to_string),
                        similarity_threshold: self.config.similarity_threshold,
                    })
                    .await
            }
            RetrievalScope::Session(session) => {
                session.search(&query_embedding, SESSION_PER_DOCUMENT_K, self.config.top_k)
            }
        }
    }

    /// Produce a grounded answer, degrading to [`RetrievalOutcome::Fallback`]
    /// on any failure along the grounded path.
    ///
    /// `instructions` are per-turn directives (response shape, domain
    /// notes) sent alongside the grounding instruction.
    pub async fn answer(
        &self,
        llm: &dyn Llm,
        generation: &GenerationConfig,
        state: &ConversationState,
        question: &str,
        instructions: &[Message],
        scope: RetrievalScope<'_>,
    ) -> RetrievalOutcome {
        match self.try_answer(llm, generation, state, question, instructions, &scope).await {
            Ok((reply, matches, attempts)) => {
                info!(fragments = matches.len(), attempts, "grounded answer produced");
                RetrievalOutcome::Grounded { reply, matches, attempts }
            }
            Err(e) => {
                warn!(error = %e, "grounded path failed, falling back to direct chat");
                RetrievalOutcome::Fallback { reason: e.to_string() }
            }
        }
    }

    async fn try_answer(
        &self,
        llm: &dyn Llm,
        generation: &GenerationConfig,
        state: &ConversationState,
        question: &str,
        instructions: &[Message],
        scope: &RetrievalScope<'_>,
    ) -> Result<(String, Vec<Match>, u32)> {
        let matches = self.retrieve(question, scope).await?;
        if matches.is_empty() {
            return Err(RagError::Retrieval("no relevant fragments found".to_string()));
        }

        let instruction = grounding_instruction(&matches);
        let mut messages = state.replay();
        messages.extend_from_slice(instructions);
        messages.push(Message::system(instruction));
        messages.push(Message::user(question));

        let mut attempts = 1;
        let mut reply = llm.generate(&messages, generation).await?;

        if !has_citation(&reply) && attempts < self.citation.max_attempts {
            attempts += 1;
            messages.push(Message::assistant(reply));
            messages.push(Message::user(citation_repair_instruction()));
            // One corrective turn only; its output is accepted as-is.
            reply = llm.generate(&messages, generation).await?;
        }

        Ok((reply, matches, attempts))
    }
}

/// The grounding instruction wrapped around the context block.
fn grounding_instruction(matches: &[Match]) -> String {
    format!(
        "Contexto de documentos:\n\n{}\n\nUsa únicamente este contexto para responder. \
         Si la información no es suficiente, indica explícitamente qué falta. \
         Incluye al final una línea: \"{CITATION_MARKER}: {{lista de índices}}\".",
        format_context(matches)
    )
}

/// The single corrective follow-up sent when the citation line is missing.
fn citation_repair_instruction() -> String {
    format!(
        "Tu respuesta no incluyó la línea de fragmentos. Repite la respuesta usando solo \
         información del contexto y agrega al final la línea \
         \"{CITATION_MARKER}: {{lista de índices}}\"."
    )
}

/// Builder for constructing a [`RetrievalOrchestrator`].
#[derive(Default)]
pub struct RetrievalOrchestratorBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    citation: Option<CitationPolicy>,
}

impl RetrievalOrchestratorBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn citation_policy(mut self, citation: CitationPolicy) -> Self {
        self.citation = Some(citation);
        self
    }

    /// Build the orchestrator, validating that all required parts are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing.
    pub fn build(self) -> Result<RetrievalOrchestrator> {
        Ok(RetrievalOrchestrator {
            config: self.config.unwrap_or_default(),
            embedder: self
                .embedder
                .ok_or_else(|| RagError::Config("embedder is required".to_string()))?,
            store: self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?,
            chunker: self
                .chunker
                .ok_or_else(|| RagError::Config("chunker is required".to_string()))?,
            citation: self.citation.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_and_short_inputs_skip_retrieval() {
        assert!(!needs_retrieval("hola"));
        assert!(!needs_retrieval("  Buenos días!  "));
        assert!(!needs_retrieval("dame el saldo"));
    }

    #[test]
    fn document_vocabulary_triggers_retrieval() {
        assert!(needs_retrieval("cuál es el total de la factura de marzo"));
        assert!(needs_retrieval("qué dice la página 3 del estado de cuenta"));
        assert!(needs_retrieval("resume la tabla de gastos del archivo"));
    }

    #[test]
    fn long_inputs_trigger_retrieval_without_vocabulary() {
        let long = "necesito que me ayudes a entender esto ".repeat(8);
        assert!(needs_retrieval(&long));
    }

    #[test]
    fn plain_chat_stays_direct() {
        assert!(!needs_retrieval("cómo estás el día de hoy amigo"));
    }

    #[test]
    fn context_enumerates_fragments_with_titles() {
        let matches = vec![
            Match {
                content: "Total: $1500".into(),
                similarity: 0.91234,
                document_id: "d1".into(),
                title: Some("Factura marzo".into()),
                metadata: None,
            },
            Match {
                content: "IVA: $240".into(),
                similarity: 0.52,
                document_id: "d1".into(),
                title: None,
                metadata: None,
            },
        ];
        let block = format_context(&matches);
        assert!(block.contains("Fragmento 1 (Factura marzo, similitud: 0.912):\nTotal: $1500"));
        assert!(block.contains("Fragmento 2 (similitud: 0.520):\nIVA: $240"));
    }

    #[test]
    fn citation_detection_is_case_insensitive() {
        assert!(has_citation("...\nFragmentos usados: 1, 3"));
        assert!(has_citation("...\nfragmentos usados: 2"));
        assert!(!has_citation("una respuesta sin citas"));
    }
}
