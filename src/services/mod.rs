//! Pipeline services.

pub mod chat_service;
pub mod chunker;
pub mod indexer;
pub mod ingestion;
pub mod query;
pub mod retriever;

pub use chat_service::ChatService;
pub use chunker::{truncate_to_bytes, Chunker, Chunks};
pub use indexer::{IndexReport, Indexer};
pub use ingestion::{IngestionPipeline, IngestionReport, IngestionStage};
pub use query::{build_system_prompt, QueryPipeline};
pub use retriever::{assemble_context, filter_matches, Retriever};
