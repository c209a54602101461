//! Local filesystem blob store.
//!
//! Documents live under `<root>/<file_key>`. Keys have the form
//! `uploads/<unix-millis><name>` with whitespace in the name replaced by
//! `-`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{StorageConfig, UploadedFile};
use crate::domain::ports::BlobStore;

const KEY_PREFIX: &str = "uploads";

#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FilesystemBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_base_url: config
                .public_base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path inside the root, refusing keys that could
    /// escape it.
    fn path_for(&self, file_key: &str) -> PipelineResult<PathBuf> {
        let key = Path::new(file_key);
        let is_plain = !file_key.is_empty()
            && key
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(PipelineError::Validation(format!("invalid file key: {file_key}")));
        }
        Ok(self.root.join(key))
    }
}

/// Build a storage key for `file_name`, unique per millisecond.
pub fn file_key_for(file_name: &str, timestamp_millis: i64) -> String {
    let name: String = file_name
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("{KEY_PREFIX}/{timestamp_millis}{name}")
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    #[instrument(skip(self))]
    async fn download(&self, file_key: &str) -> PipelineResult<Bytes> {
        let path = self.path_for(file_key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(bytes = data.len(), "downloaded blob");
                Ok(Bytes::from(data))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(file_key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, file_key: &str) -> PipelineResult<bool> {
        let path = self.path_for(file_key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn upload(&self, bytes: Bytes, file_name: &str) -> PipelineResult<UploadedFile> {
        if file_name.trim().is_empty() {
            return Err(PipelineError::Validation("file name must not be empty".to_string()));
        }

        let file_key = file_key_for(file_name, Utc::now().timestamp_millis());
        let path = self.path_for(&file_key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        debug!(file_key = %file_key, "stored upload");
        Ok(UploadedFile {
            file_key,
            file_name: file_name.to_string(),
        })
    }

    fn url_for(&self, file_key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{file_key}"),
            None => format!("file://{}", self.root.join(file_key).display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_key_replaces_whitespace() {
        assert_eq!(
            file_key_for("my annual\treport.pdf", 1_700_000_000_000),
            "uploads/1700000000000my-annual-report.pdf"
        );
        assert_eq!(file_key_for("../x.pdf", 1), "uploads/1..-x.pdf");
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        let uploaded = store.upload(Bytes::from_static(b"%PDF-1.5"), "doc one.pdf").await.unwrap();
        assert!(uploaded.file_key.starts_with("uploads/"));
        assert!(uploaded.file_key.ends_with("doc-one.pdf"));
        assert_eq!(uploaded.file_name, "doc one.pdf");

        assert!(store.exists(&uploaded.file_key).await.unwrap());
        let bytes = store.download(&uploaded.file_key).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        let err = store.download("uploads/missing.pdf").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
        assert!(!store.exists("uploads/missing.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        for key in ["../secret", "/etc/passwd", ""] {
            let err = store.download(key).await.unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)), "{key}");
        }
    }

    #[test]
    fn test_url_for() {
        let store = FilesystemBlobStore::from_config(&StorageConfig {
            root: PathBuf::from("/data"),
            public_base_url: Some("https://cdn.example.com/".to_string()),
        });
        assert_eq!(store.url_for("uploads/1a.pdf"), "https://cdn.example.com/uploads/1a.pdf");

        let local = FilesystemBlobStore::new("/data");
        assert_eq!(local.url_for("uploads/1a.pdf"), "file:///data/uploads/1a.pdf");
    }
}
