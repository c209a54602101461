pub mod chat;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;

pub use chat::{Chat, ChatMessage, Role, StoredMessage};
pub use chunking::{Chunk, ChunkingConfig};
pub use config::{
    Config, EmbeddingConfig, IngestionConfig, LlmConfig, LoggingConfig, PineconeConfig,
    QueryConfig, RateLimitConfig, RetrievalConfig, RetryConfig, ServerConfig, StorageConfig,
    VectorBackend, VectorIndexConfig, DEFAULT_DECLINE_PHRASE,
};
pub use document::{Namespace, Page, UploadedFile};
pub use embedding::{content_hash, cosine_similarity, EmbeddingRecord, QueryMatch, RecordMetadata};
