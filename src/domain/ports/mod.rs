//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters implement:
//! - BlobStore: raw document storage
//! - PdfParser: per-page text extraction
//! - EmbeddingProvider: text to vector
//! - VectorIndex: namespaced vector upsert and nearest-neighbour query
//! - LanguageModel: chat completion, whole or streamed
//! - ChatRepository: chat and message history
//!
//! Services hold these as `Arc<dyn Trait>` so clients are built once at
//! startup and shared by every pipeline run.

pub mod blob_store;
pub mod chat_repository;
pub mod embedding;
pub mod language_model;
pub mod pdf_parser;
pub mod vector_index;

pub use blob_store::BlobStore;
pub use chat_repository::ChatRepository;
pub use embedding::EmbeddingProvider;
pub use language_model::{LanguageModel, TextStream};
pub use pdf_parser::PdfParser;
pub use vector_index::VectorIndex;
