//! Domain errors for the pdfchat pipelines.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the ingestion and query pipelines.
///
/// Each variant names the stage that failed. Every stage fails fast, so a
/// variant reaching the caller means the enclosing pipeline was aborted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Document has no pages: {0}")]
    EmptyDocument(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Indexing failed: {0}")]
    Indexing(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Chat not found: {0}")]
    ChatNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl PipelineError {
    /// Short machine-readable code, used in HTTP error bodies and JSON output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Parse(_) => "PARSE_ERROR",
            Self::EmptyDocument(_) => "EMPTY_DOCUMENT",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::Indexing(_) => "INDEXING_ERROR",
            Self::Retrieval(_) => "RETRIEVAL_ERROR",
            Self::Generation(_) => "GENERATION_ERROR",
            Self::ChatNotFound(_) => "CHAT_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Storage(err.to_string())
        }
    }
}
