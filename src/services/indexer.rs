//! Embedding and indexing of document chunks.
//!
//! Every chunk is embedded concurrently (bounded by `max_concurrency`), then
//! all records of the document are written to its namespace in one upsert.
//! An embedding failure aborts before anything is written.

use std::collections::HashSet;
use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{Chunk, EmbeddingRecord, Namespace, RecordMetadata};
use crate::domain::ports::{EmbeddingProvider, VectorIndex};

/// Outcome of indexing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Namespace written to
    pub namespace: Namespace,
    /// Distinct ids of the upserted records, in chunk order
    pub record_ids: Vec<String>,
}

impl IndexReport {
    /// Number of distinct records written.
    pub fn records(&self) -> usize {
        self.record_ids.len()
    }
}

/// Embeds chunks and writes them to a vector index.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    max_concurrency: usize,
}

impl Indexer {
    /// At most `max_concurrency` embedding requests run at once.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Embed every chunk into a record. Output order matches `chunks`.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> PipelineResult<Vec<EmbeddingRecord>> {
        let pending: Vec<_> = chunks
            .iter()
            .map(|chunk| embed_chunk(Arc::clone(&self.embedder), chunk.clone()))
            .collect();
        let records: Vec<EmbeddingRecord> = stream::iter(pending)
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        debug!(records = records.len(), "embedded chunks");
        Ok(records)
    }

    /// Write `records` to `namespace` in a single upsert. Records sharing
    /// an id are written once.
    #[instrument(skip_all, fields(namespace = %namespace, records = records.len()))]
    pub async fn upsert(&self, namespace: &Namespace, records: Vec<EmbeddingRecord>) -> PipelineResult<IndexReport> {
        let dimension = self.index.dimension();
        if let Some(bad) = records.iter().find(|r| r.dimension() != dimension) {
            return Err(PipelineError::Indexing(format!(
                "embedding has {} dimensions, {} index expects {}",
                bad.dimension(),
                self.index.name(),
                dimension
            )));
        }

        // Identical chunk text hashes to the same id; keep the first.
        let mut seen = HashSet::new();
        let records: Vec<EmbeddingRecord> = records.into_iter().filter(|r| seen.insert(r.id.clone())).collect();

        let record_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        if !records.is_empty() {
            self.index.upsert(namespace, records).await?;
        }

        info!(backend = self.index.name(), records = record_ids.len(), "indexed records");
        Ok(IndexReport {
            namespace: namespace.clone(),
            record_ids,
        })
    }

    /// Embed then upsert.
    pub async fn index(&self, namespace: &Namespace, chunks: &[Chunk]) -> PipelineResult<IndexReport> {
        let records = self.embed_chunks(chunks).await?;
        self.upsert(namespace, records).await
    }
}

async fn embed_chunk(embedder: Arc<dyn EmbeddingProvider>, chunk: Chunk) -> PipelineResult<EmbeddingRecord> {
    let values = embedder.embed(&chunk.text).await?;
    Ok(EmbeddingRecord::new(
        &chunk.text,
        values,
        RecordMetadata {
            text: chunk.page_text.to_string(),
            page_number: chunk.page_number,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::vector::InMemoryVectorIndex;
    use crate::domain::models::ChunkingConfig;
    use crate::domain::models::Page;
    use crate::services::Chunker;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &'static str {
            "length"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.is_some_and(|needle| text.contains(needle)) {
                return Err(PipelineError::Embedding("upstream unavailable".into()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn chunks() -> Vec<Chunk> {
        let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
        chunker.split_pages(&[Page::new(1, "The sky is blue."), Page::new(2, "Paris is in France.")])
    }

    fn indexer(fail_on: Option<&'static str>, dimension: usize) -> (Indexer, Arc<InMemoryVectorIndex>) {
        let index = Arc::new(InMemoryVectorIndex::new(dimension));
        let embedder = Arc::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
            fail_on,
        });
        (Indexer::new(embedder, index.clone(), 4), index)
    }

    #[tokio::test]
    async fn test_index_upserts_all_chunks() {
        let (indexer, index) = indexer(None, 2);
        let ns = Namespace::from_file_key("doc.pdf");

        let report = indexer.index(&ns, &chunks()).await.unwrap();
        assert_eq!(report.records(), 2);
        assert_eq!(index.count(&ns).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_writes_nothing() {
        let (indexer, index) = indexer(Some("Paris"), 2);
        let ns = Namespace::from_file_key("doc.pdf");

        let err = indexer.index(&ns, &chunks()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
        assert_eq!(index.count(&ns).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_indexing_error() {
        let (indexer, _) = indexer(None, 3);
        let ns = Namespace::from_file_key("doc.pdf");

        let err = indexer.index(&ns, &chunks()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Indexing(_)));
    }

    #[tokio::test]
    async fn test_records_carry_page_metadata() {
        let (indexer, _) = indexer(None, 2);
        let records = indexer.embed_chunks(&chunks()).await.unwrap();

        assert_eq!(records[0].metadata.page_number, 1);
        assert_eq!(records[1].metadata.text, "Paris is in France.");
        assert_eq!(records[0].id, crate::domain::models::content_hash("The sky is blue."));
    }

    #[tokio::test]
    async fn test_identical_pages_count_once() {
        let (indexer, index) = indexer(None, 2);
        let ns = Namespace::from_file_key("doc.pdf");
        let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
        let chunks = chunker.split_pages(&[Page::new(1, "Confidential"), Page::new(2, "Confidential")]);
        assert_eq!(chunks.len(), 2);

        let report = indexer.index(&ns, &chunks).await.unwrap();
        assert_eq!(report.records(), 1);
        assert_eq!(index.count(&ns).await.unwrap(), 1);
    }
}
