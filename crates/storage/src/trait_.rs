//! Blob store trait abstraction.

use async_trait::async_trait;
use dcqc_core::QcError;
use std::path::{Path, PathBuf};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<StorageError> for QcError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => QcError::Io(e),
            StorageError::Json(e) => QcError::Json(e),
            other => QcError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Remote metadata of a stored blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobInfo {
    /// Version label, when the store tracks one
    pub version: Option<String>,

    /// Original filename, when known
    pub filename: Option<String>,
}

/// Capability for resolving and fetching remotely stored files.
///
/// Implementations must not retry; failures surface to the calling stage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Look up the metadata of a blob.
    async fn resolve(&self, id: &str) -> Result<BlobInfo>;

    /// Download a blob into `dest_dir`, returning the written path.
    async fn download(&self, id: &str, dest_dir: &Path) -> Result<PathBuf>;
}
