//! Document ingestion pipeline.
//!
//! `Downloaded -> Parsed -> Chunked -> Embedded -> Indexed`, strictly in
//! order for one document. The first failing stage aborts the run.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use super::chunker::Chunker;
use super::indexer::Indexer;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::Namespace;
use crate::domain::ports::{BlobStore, PdfParser};

/// Last stage an ingestion run completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStage {
    Downloaded,
    Parsed,
    Chunked,
    Embedded,
    Indexed,
}

impl IngestionStage {
    /// Lowercase stage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::Parsed => "parsed",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Indexed => "indexed",
        }
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a finished ingestion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub file_key: String,
    pub namespace: Namespace,
    /// Pages parsed, including pages without text
    pub pages: usize,
    pub chunks: usize,
    /// Distinct records in the namespace after the run
    pub records: usize,
    pub stage: IngestionStage,
}

/// Turns a stored PDF into indexed records.
pub struct IngestionPipeline {
    blob_store: Arc<dyn BlobStore>,
    parser: Arc<dyn PdfParser>,
    chunker: Chunker,
    indexer: Indexer,
}

impl IngestionPipeline {
    /// Pipeline reading from `blob_store` and writing through `indexer`.
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        parser: Arc<dyn PdfParser>,
        chunker: Chunker,
        indexer: Indexer,
    ) -> Self {
        Self {
            blob_store,
            parser,
            chunker,
            indexer,
        }
    }

    /// Ingest the document stored under `file_key`.
    pub async fn ingest(&self, file_key: &str) -> PipelineResult<IngestionReport> {
        self.ingest_with_observer(file_key, &|_| {}).await
    }

    /// Ingest `file_key`, calling `observer` after each completed stage.
    #[instrument(skip(self, observer))]
    pub async fn ingest_with_observer(
        &self,
        file_key: &str,
        observer: &(dyn Fn(IngestionStage) + Send + Sync),
    ) -> PipelineResult<IngestionReport> {
        let namespace = Namespace::from_file_key(file_key);
        let advance = |stage: IngestionStage| {
            info!(stage = %stage, namespace = %namespace, "ingestion stage complete");
            observer(stage);
        };

        let bytes = self.blob_store.download(file_key).await?;
        advance(IngestionStage::Downloaded);

        let parser = Arc::clone(&self.parser);
        let pages = tokio::task::spawn_blocking(move || parser.parse(&bytes))
            .await
            .map_err(|e| PipelineError::Parse(format!("parser task failed: {e}")))??;
        if pages.is_empty() {
            return Err(PipelineError::EmptyDocument(file_key.to_string()));
        }
        advance(IngestionStage::Parsed);

        let chunks = self.chunker.split_pages(&pages);
        advance(IngestionStage::Chunked);

        let records = self.indexer.embed_chunks(&chunks).await?;
        advance(IngestionStage::Embedded);

        let report = self.indexer.upsert(&namespace, records).await?;
        advance(IngestionStage::Indexed);

        Ok(IngestionReport {
            file_key: file_key.to_string(),
            namespace,
            pages: pages.len(),
            chunks: chunks.len(),
            records: report.records(),
            stage: IngestionStage::Indexed,
        })
    }
}
