//! Storage backends for document content.
//!
//! Document rows in postgres only carry metadata plus a `storage_key`; the
//! bytes live behind one of these backends.

use crate::db::errors::{DbError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Trait for document storage backends
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Store document content and return its storage key
    async fn store(&self, content: Bytes) -> Result<Uuid>;

    /// Retrieve document content by storage key
    async fn retrieve(&self, storage_key: Uuid) -> Result<Bytes>;

    /// Delete document content by storage key
    async fn delete(&self, storage_key: Uuid) -> Result<()>;

    /// Check whether content exists for a storage key
    async fn exists(&self, storage_key: Uuid) -> Result<bool>;
}

// ============================================================================
// Local Filesystem Storage Implementation
// ============================================================================

/// Local filesystem backend. Files are sharded into subdirectories by the
/// first two hex characters of the storage key to keep directories small.
pub struct LocalDocumentStorage {
    base_path: PathBuf,
}

impl LocalDocumentStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn path_for(&self, storage_key: Uuid) -> PathBuf {
        let key = storage_key.simple().to_string();
        self.base_path.join(&key[..2]).join(format!("{key}.dat"))
    }
}

#[async_trait]
impl DocumentStorage for LocalDocumentStorage {
    async fn store(&self, content: Bytes) -> Result<Uuid> {
        let storage_key = Uuid::new_v4();
        let full_path = self.path_for(storage_key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;

        Ok(storage_key)
    }

    async fn retrieve(&self, storage_key: Uuid) -> Result<Bytes> {
        let full_path = self.path_for(storage_key);

        if !full_path.exists() {
            return Err(DbError::NotFound);
        }

        let mut file = fs::File::open(&full_path).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;

        Ok(Bytes::from(content))
    }

    async fn delete(&self, storage_key: Uuid) -> Result<()> {
        let full_path = self.path_for(storage_key);

        if full_path.exists() {
            fs::remove_file(&full_path).await?;
        }

        Ok(())
    }

    async fn exists(&self, storage_key: Uuid) -> Result<bool> {
        Ok(self.path_for(storage_key).exists())
    }
}

// ============================================================================
// Noop Storage Implementation
// ============================================================================

/// No-op backend used where document storage isn't needed, e.g. when
/// constructing state for middleware.
pub struct NoopDocumentStorage;

#[async_trait]
impl DocumentStorage for NoopDocumentStorage {
    async fn store(&self, _content: Bytes) -> Result<Uuid> {
        Err(DbError::Other(anyhow::anyhow!(
            "NoopDocumentStorage: document storage operations are not supported in this context"
        )))
    }

    async fn retrieve(&self, _storage_key: Uuid) -> Result<Bytes> {
        Err(DbError::Other(anyhow::anyhow!(
            "NoopDocumentStorage: document storage operations are not supported in this context"
        )))
    }

    async fn delete(&self, _storage_key: Uuid) -> Result<()> {
        Err(DbError::Other(anyhow::anyhow!(
            "NoopDocumentStorage: document storage operations are not supported in this context"
        )))
    }

    async fn exists(&self, _storage_key: Uuid) -> Result<bool> {
        Err(DbError::Other(anyhow::anyhow!(
            "NoopDocumentStorage: document storage operations are not supported in this context"
        )))
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create a document storage backend based on configuration
pub async fn create_document_storage(
    config: &crate::config::StorageConfig,
) -> Result<Arc<dyn DocumentStorage>> {
    match config.backend {
        crate::config::StorageBackend::Local => {
            tracing::info!("Creating local document storage backend (path: {:?})", config.path);
            if let Err(e) = tokio::fs::create_dir_all(&config.path).await {
                return Err(DbError::Other(anyhow::anyhow!(
                    "Failed to create local storage directory {:?}: {}",
                    config.path,
                    e
                )));
            }
            Ok(Arc::new(LocalDocumentStorage::new(config.path.clone())))
        }
        crate::config::StorageBackend::Noop => Ok(Arc::new(NoopDocumentStorage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalDocumentStorage::new(temp_dir.path().to_path_buf());

        let content = Bytes::from_static(b"operator manual contents");

        let storage_key = storage.store(content.clone()).await.unwrap();

        assert!(storage.exists(storage_key).await.unwrap());

        let retrieved = storage.retrieve(storage_key).await.unwrap();
        assert_eq!(retrieved, content);

        storage.delete(storage_key).await.unwrap();
        assert!(!storage.exists(storage_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_shards_by_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalDocumentStorage::new(temp_dir.path().to_path_buf());

        let storage_key = storage.store(Bytes::from_static(b"x")).await.unwrap();

        let prefix = storage_key.simple().to_string()[..2].to_string();
        assert!(temp_dir.path().join(prefix).is_dir());
    }

    #[tokio::test]
    async fn test_local_storage_retrieve_nonexistent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalDocumentStorage::new(temp_dir.path().to_path_buf());

        let result = storage.retrieve(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_noop_storage_rejects_operations() {
        let storage = NoopDocumentStorage;
        assert!(storage.store(Bytes::from_static(b"x")).await.is_err());
        assert!(storage.retrieve(Uuid::new_v4()).await.is_err());
    }
}
