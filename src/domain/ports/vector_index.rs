//! Vector index port.

use async_trait::async_trait;

use crate::domain::errors::PipelineResult;
use crate::domain::models::{EmbeddingRecord, Namespace, QueryMatch};

/// Namespaced vector storage with nearest-neighbour lookup.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name (e.g., "sqlite", "pinecone").
    fn name(&self) -> &'static str;

    /// Dimension every stored vector must have.
    fn dimension(&self) -> usize;

    /// Insert or overwrite `records` in `namespace`, keyed by record id.
    ///
    /// Fails with `PipelineError::Indexing`.
    async fn upsert(&self, namespace: &Namespace, records: Vec<EmbeddingRecord>) -> PipelineResult<()>;

    /// The `top_k` records closest to `vector`, best first.
    ///
    /// An unknown namespace yields no matches. Fails with
    /// `PipelineError::Retrieval`.
    async fn query(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> PipelineResult<Vec<QueryMatch>>;

    /// Number of records stored in `namespace`.
    async fn count(&self, namespace: &Namespace) -> PipelineResult<usize>;
}
