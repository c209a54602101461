//! Application wiring
//!
//! Builds every adapter once from [`Config`] and assembles the pipelines on
//! top of them. The CLI and the HTTP server share the resulting
//! [`AppContext`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::blob::FilesystemBlobStore;
use crate::adapters::chat::InMemoryChatRepository;
use crate::adapters::embeddings::OpenAiEmbeddingProvider;
use crate::adapters::llm::OpenAiChatModel;
use crate::adapters::pdf::LopdfParser;
use crate::adapters::sqlite::{initialize_database, SqliteVectorIndex};
use crate::adapters::vector::{InMemoryVectorIndex, PineconeVectorIndex};
use crate::domain::models::{Config, VectorBackend};
use crate::domain::ports::{
    BlobStore, ChatRepository, EmbeddingProvider, LanguageModel, PdfParser, VectorIndex,
};
use crate::infrastructure::http_client::{RequestRateLimiter, RetryPolicy};
use crate::services::{ChatService, Chunker, Indexer, IngestionPipeline, QueryPipeline, Retriever};

/// Adapters the pipelines are built from.
pub struct Adapters {
    pub blob_store: Arc<dyn BlobStore>,
    pub parser: Arc<dyn PdfParser>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub llm: Arc<dyn LanguageModel>,
    pub chats: Arc<dyn ChatRepository>,
}

/// Fully wired application.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub blob_store: Arc<dyn BlobStore>,
    pub index: Arc<dyn VectorIndex>,
    pub ingestion: Arc<IngestionPipeline>,
    pub query: Arc<QueryPipeline>,
    pub chats: Arc<ChatService>,
}

impl AppContext {
    /// Build the production adapters described by `config`.
    pub async fn build(config: Config) -> Result<Self> {
        let retry_policy = RetryPolicy::from_config(&config.retry);
        let rate_limiter = RequestRateLimiter::from_config(&config.rate_limit);

        let embedder = OpenAiEmbeddingProvider::new(config.embedding.clone())
            .context("Failed to create embedding client")?
            .with_retry_policy(retry_policy.clone())
            .with_rate_limiter(rate_limiter.clone());

        let llm = OpenAiChatModel::new(config.llm.clone())
            .context("Failed to create chat model client")?
            .with_retry_policy(retry_policy.clone())
            .with_rate_limiter(rate_limiter.clone());

        let index = build_vector_index(&config, retry_policy, rate_limiter).await?;
        info!(
            backend = index.name(),
            embedding_model = %config.embedding.model,
            chat_model = %config.llm.model,
            "adapters ready"
        );

        let adapters = Adapters {
            blob_store: Arc::new(FilesystemBlobStore::from_config(&config.storage)),
            parser: Arc::new(LopdfParser::new()),
            embedder: Arc::new(embedder),
            index,
            llm: Arc::new(llm),
            chats: Arc::new(InMemoryChatRepository::new()),
        };
        Self::from_adapters(config, adapters)
    }

    /// Assemble the pipelines over already-built adapters.
    pub fn from_adapters(config: Config, adapters: Adapters) -> Result<Self> {
        let chunker = Chunker::new(config.chunking.clone()).context("Invalid chunking configuration")?;
        let indexer = Indexer::new(
            Arc::clone(&adapters.embedder),
            Arc::clone(&adapters.index),
            config.ingestion.max_concurrency,
        );
        let ingestion = Arc::new(IngestionPipeline::new(
            Arc::clone(&adapters.blob_store),
            adapters.parser,
            chunker,
            indexer,
        ));

        let retriever = Retriever::new(
            adapters.embedder,
            Arc::clone(&adapters.index),
            config.retrieval.clone(),
        );
        let query = Arc::new(QueryPipeline::new(retriever, adapters.llm, config.query.clone()));

        let chats = Arc::new(ChatService::new(
            Arc::clone(&adapters.blob_store),
            Arc::clone(&ingestion),
            Arc::clone(&query),
            adapters.chats,
        ));

        Ok(Self {
            config: Arc::new(config),
            blob_store: adapters.blob_store,
            index: adapters.index,
            ingestion,
            query,
            chats,
        })
    }
}

async fn build_vector_index(
    config: &Config,
    retry_policy: RetryPolicy,
    rate_limiter: RequestRateLimiter,
) -> Result<Arc<dyn VectorIndex>> {
    let dimension = config.embedding.dimension;
    let index: Arc<dyn VectorIndex> = match config.vector_index.backend {
        VectorBackend::Memory => Arc::new(InMemoryVectorIndex::new(dimension)),
        VectorBackend::Sqlite => {
            let path = Path::new(&config.vector_index.sqlite_path);
            let pool = initialize_database(path)
                .await
                .with_context(|| format!("Failed to open vector database at {}", path.display()))?;
            Arc::new(SqliteVectorIndex::new(pool, dimension))
        }
        VectorBackend::Pinecone => Arc::new(
            PineconeVectorIndex::new(&config.vector_index.pinecone, dimension)
                .context("Failed to create Pinecone client")?
                .with_retry_policy(retry_policy)
                .with_rate_limiter(rate_limiter),
        ),
    };
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_with_sqlite_backend() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.vector_index.sqlite_path = dir.path().join("vectors.db").display().to_string();
        config.storage.root = dir.path().join("blobs");

        let app = AppContext::build(config).await.unwrap();
        assert_eq!(app.index.name(), "sqlite");
        assert_eq!(app.index.dimension(), 1536);
        assert!(dir.path().join("vectors.db").exists());
    }

    #[tokio::test]
    async fn test_pinecone_backend_requires_host() {
        let mut config = Config::default();
        config.vector_index.backend = VectorBackend::Pinecone;

        assert!(AppContext::build(config).await.is_err());
    }
}
