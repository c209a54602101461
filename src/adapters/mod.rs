//! Adapters connecting the pipelines to external systems.

pub mod blob;
pub mod chat;
pub mod embeddings;
pub mod http;
pub mod llm;
pub mod pdf;
pub mod sqlite;
pub mod vector;
