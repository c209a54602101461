//! Embedding provider port for semantic vector generation.

use async_trait::async_trait;

use crate::domain::errors::PipelineResult;

/// Converts text into a dense vector of fixed dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    ///
    /// Fails with `PipelineError::Embedding` on network failure or a
    /// malformed response.
    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>>;
}
