//! Semantic memory layer.
//!
//! Canon entities are rendered to canonical text ([`render`]), embedded via
//! an [`EmbeddingService`], stored in a [`VectorStore`], and queried through
//! the [`VectorIndex`]. Indexing runs off the write path through the
//! [`worker`] outbox.

pub mod http;
pub mod index;
pub mod provider;
pub mod render;
pub mod store;
pub mod worker;

use async_trait::async_trait;

use crate::DramaturgError;

pub use http::HttpEmbeddingService;
pub use index::{ContradictionReport, RetrievalConfig, VectorIndex, VectorMatch};
pub use provider::{create_embedding_service, load_provider_config, EmbeddingProviderConfig};
pub use store::{SurrealVectorStore, VectorHit, VectorRow, VectorStore};
pub use worker::{IndexQueue, IndexWorker};

/// Embedding dimensions used unless the provider config says otherwise.
pub const DEFAULT_DIMENSIONS: usize = 512;

/// Service trait for generating text embeddings.
///
/// Abstracts embedding operations to allow different implementations
/// (HTTP APIs, mock services for testing).
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embedding for a single text string.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DramaturgError>;

    /// Generate embeddings for multiple texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DramaturgError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_text(text).await?);
        }
        Ok(out)
    }

    /// Embedding dimensions (e.g., 512).
    fn dimensions(&self) -> usize;

    /// False when no credential is configured. Callers skip indexing and
    /// return empty search results instead of failing.
    fn is_available(&self) -> bool;
}

/// Embedding service used when no credential is configured.
///
/// Returns zero vectors and reports itself unavailable, so search degrades to
/// empty results rather than failing.
pub struct NoopEmbeddingService {
    dimensions: usize,
}

impl Default for NoopEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopEmbeddingService {
    pub fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingService for NoopEmbeddingService {
    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, DramaturgError> {
        Ok(vec![0.0; self.dimensions])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_returns_zero_vector() {
        let service = NoopEmbeddingService::new();
        let v = service.embed_text("김서연").await.unwrap();
        assert_eq!(v.len(), DEFAULT_DIMENSIONS);
        assert!(v.iter().all(|x| *x == 0.0));
        assert!(!service.is_available());
    }
}
