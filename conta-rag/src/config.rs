//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval pipeline.
///
/// The similarity threshold and top-k defaults mirror the values the
/// production store was queried with; they are tunables, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Upper bound callers may raise `top_k` to at the query boundary.
    pub max_top_k: usize,
    /// Minimum similarity score for results (results below are filtered out).
    pub similarity_threshold: f32,
    /// Embedding dimensionality the store enforces.
    pub dimensions: usize,
    /// Maximum chunks per ingest batch.
    pub ingest_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
            top_k: 5,
            max_top_k: 50,
            similarity_threshold: 0.3,
            dimensions: 768,
            ingest_batch_size: 100,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Clamp a caller-supplied result count to `1..=max_top_k`,
    /// falling back to the configured default when absent.
    pub fn clamp_top_k(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(k) if k >= 1 && k <= self.max_top_k => k,
            _ => self.top_k,
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    pub fn ingest_batch_size(mut self, size: usize) -> Self {
        self.config.ingest_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `top_k > max_top_k`
    /// - `similarity_threshold` is outside `[-1, 1]`
    /// - `dimensions == 0` or `ingest_batch_size == 0`
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.chunk_overlap >= c.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.top_k == 0 || c.top_k > c.max_top_k {
            return Err(RagError::Config(format!(
                "top_k ({}) must be in 1..={}",
                c.top_k, c.max_top_k
            )));
        }
        if !(-1.0..=1.0).contains(&c.similarity_threshold) {
            return Err(RagError::Config(format!(
                "similarity_threshold ({}) must be within [-1, 1]",
                c.similarity_threshold
            )));
        }
        if c.dimensions == 0 {
            return Err(RagError::Config("dimensions must be greater than zero".to_string()));
        }
        if c.ingest_batch_size == 0 {
            return Err(RagError::Config(
                "ingest_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn threshold_outside_cosine_range_is_rejected() {
        let err = RagConfig::builder().similarity_threshold(1.5).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn clamp_top_k_bounds_requests() {
        let config = RagConfig::default();
        assert_eq!(config.clamp_top_k(None), 5);
        assert_eq!(config.clamp_top_k(Some(2)), 2);
        assert_eq!(config.clamp_top_k(Some(0)), 5);
        assert_eq!(config.clamp_top_k(Some(51)), 5);
        assert_eq!(config.clamp_top_k(Some(50)), 50);
    }
}
