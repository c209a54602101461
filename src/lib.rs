//! pdfchat - chat with PDF documents
//!
//! Uploaded PDFs are parsed, chunked, embedded and stored in a vector index
//! under a per-document namespace. Questions are answered by retrieving the
//! closest chunks and asking a language model to answer from them alone.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the port traits
//! - **Service Layer** (`services`): Chunking, indexing, retrieval and the two pipelines
//! - **Adapters** (`adapters`): OpenAI, Pinecone, SQLite, lopdf, filesystem and the HTTP API
//! - **Infrastructure Layer** (`infrastructure`): Configuration, logging, HTTP client plumbing, wiring
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{PipelineError, PipelineResult};
pub use domain::models::{ChatMessage, Config, Namespace, Page, Role};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::{Adapters, AppContext};
pub use services::{ChatService, Chunker, IngestionPipeline, QueryPipeline, Retriever};
