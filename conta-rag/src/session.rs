//! Ephemeral session documents and local similarity search.
//!
//! When a user skips persistence ("temporary context"), their documents
//! live only in memory for the session. Search over them is a brute-force
//! cosine scan — the set is one session's handful of documents, not a
//! corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Match;
use crate::error::{RagError, Result};

/// Compute cosine similarity between two equal-length vectors.
///
/// Defined as 0.0 when either vector has zero magnitude.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch { left: a.len(), right: b.len() });
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// A chunk held in session memory: content plus its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A document held only for the lifetime of the client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub chunks: Vec<SessionChunk>,
    pub uploaded_at: DateTime<Utc>,
}

/// Rank session chunks by cosine similarity to the query, descending.
///
/// Returns `(chunk index, similarity)` pairs for the top `top_k` chunks.
pub fn search_chunks(
    query_embedding: &[f32],
    chunks: &[SessionChunk],
    top_k: usize,
) -> Result<Vec<(usize, f32)>> {
    let mut scored = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let similarity = cosine_similarity(query_embedding, &chunk.embedding)?;
        scored.push((index, similarity));
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    Ok(scored)
}

/// The in-memory collection of a session's temporary documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    documents: Vec<SessionDocument>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to the session set.
    pub fn add_document(&mut self, document: SessionDocument) {
        debug!(id = %document.id, chunks = document.chunks.len(), "session document added");
        self.documents.push(document);
    }

    /// Remove a document by id. Returns whether one was removed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        before != self.documents.len()
    }

    /// Drop every session document.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    pub fn documents(&self) -> &[SessionDocument] {
        &self.documents
    }

    /// Search every session document and merge the results.
    ///
    /// Takes the top `per_document_k` chunks from each document, then the
    /// overall top `top_k` across documents, ranked by similarity
    /// descending.
    pub fn search(
        &self,
        query_embedding: &[f32],
        per_document_k: usize,
        top_k: usize,
    ) -> Result<Vec<Match>> {
        let mut all: Vec<Match> = Vec::new();
        for document in &self.documents {
            for (index, similarity) in
                search_chunks(query_embedding, &document.chunks, per_document_k)?
            {
                all.push(Match {
                    content: document.chunks[index].content.clone(),
                    similarity,
                    document_id: document.id.clone(),
                    title: Some(document.title.clone()),
                    metadata: None,
                });
            }
        }
        all.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        all.truncate(top_k);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_a_vector_with_itself_is_one() {
        let v = vec![0.3, -0.5, 0.8, 0.1];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_a_vector_with_its_negation_is_minus_one() {
        let v = vec![0.3, -0.5, 0.8, 0.1];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let sim = cosine_similarity(&v, &neg).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_a_zero_vector_is_zero() {
        let v = vec![0.3, -0.5, 0.8];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&v, &zero).unwrap(), 0.0);
    }

    #[test]
    fn unequal_lengths_are_a_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { left: 2, right: 3 }));
    }

    fn doc(id: &str, title: &str, chunks: Vec<SessionChunk>) -> SessionDocument {
        SessionDocument {
            id: id.to_string(),
            title: title.to_string(),
            filename: format!("{id}.txt"),
            chunks,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn search_ranks_across_documents() {
        let mut ctx = SessionContext::new();
        ctx.add_document(doc(
            "d1",
            "Facturas enero",
            vec![
                SessionChunk { content: "lejano".into(), embedding: vec![0.0, 1.0] },
                SessionChunk { content: "cercano".into(), embedding: vec![1.0, 0.1] },
            ],
        ));
        ctx.add_document(doc(
            "d2",
            "Estado de cuenta",
            vec![SessionChunk { content: "exacto".into(), embedding: vec![1.0, 0.0] }],
        ));

        let results = ctx.search(&[1.0, 0.0], 3, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "exacto");
        assert_eq!(results[0].document_id, "d2");
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[1].content, "cercano");
    }

    #[test]
    fn remove_and_clear_manage_the_set() {
        let mut ctx = SessionContext::new();
        ctx.add_document(doc("d1", "Uno", vec![]));
        ctx.add_document(doc("d2", "Dos", vec![]));
        assert!(ctx.has_documents());

        assert!(ctx.remove_document("d1"));
        assert!(!ctx.remove_document("d1"));
        assert_eq!(ctx.documents().len(), 1);

        ctx.clear();
        assert!(!ctx.has_documents());
    }
}
