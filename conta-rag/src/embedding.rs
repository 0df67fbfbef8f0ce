//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a hosted embedding backend behind a unified async
/// interface. [`embed`](EmbeddingProvider::embed) is for queries;
/// [`embed_batch`](EmbeddingProvider::embed_batch) is for document chunks
/// and is order-preserving: one vector per input text, in input order.
///
/// Every vector produced by one provider has the same length
/// ([`dimensions`](EmbeddingProvider::dimensions)); enforcing that length
/// is the vector store's job, not the provider's. A failed call must
/// surface an error — never a substitute zero vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single query text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of document texts.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially. Backends with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
