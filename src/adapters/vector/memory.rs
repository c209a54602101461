//! In-process vector index.
//!
//! Brute-force cosine scoring over a map per namespace. Suitable for tests
//! and single-run CLI sessions; nothing survives the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::check_dimensions;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{cosine_similarity, EmbeddingRecord, Namespace, QueryMatch};
use crate::domain::ports::VectorIndex;

#[derive(Debug)]
pub struct InMemoryVectorIndex {
    dimension: usize,
    namespaces: RwLock<HashMap<Namespace, HashMap<String, EmbeddingRecord>>>,
}

impl InMemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            namespaces: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, namespace: &Namespace, records: Vec<EmbeddingRecord>) -> PipelineResult<()> {
        check_dimensions(&records, self.dimension)?;

        let mut namespaces = self.namespaces.write().await;
        let entries = namespaces.entry(namespace.clone()).or_default();
        for record in records {
            entries.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> PipelineResult<Vec<QueryMatch>> {
        if vector.len() != self.dimension {
            return Err(PipelineError::Retrieval(format!(
                "query vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let namespaces = self.namespaces.read().await;
        let Some(entries) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<QueryMatch> = entries
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.values),
                metadata: record.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self, namespace: &Namespace) -> PipelineResult<usize> {
        Ok(self
            .namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, HashMap::len))
    }
}
