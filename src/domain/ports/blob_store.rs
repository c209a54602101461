//! Blob storage port for uploaded documents.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::PipelineResult;
use crate::domain::models::UploadedFile;

/// Stores raw document bytes under opaque file keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the bytes stored under `file_key`.
    ///
    /// Fails with `PipelineError::NotFound` when nothing is stored there.
    async fn download(&self, file_key: &str) -> PipelineResult<Bytes>;

    /// Whether anything is stored under `file_key`.
    async fn exists(&self, file_key: &str) -> PipelineResult<bool>;

    /// Store `bytes` under a freshly generated key derived from `file_name`.
    async fn upload(&self, bytes: Bytes, file_name: &str) -> PipelineResult<UploadedFile>;

    /// URL the document can be fetched from by a viewer.
    fn url_for(&self, file_key: &str) -> String;
}
