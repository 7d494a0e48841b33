//! Shared fixtures for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcqc_core::{LogArtifactPaths, Metadata, QcConfig};
use dcqc_storage::{BlobStore, LocalBlobStore};

use crate::target::{QcTarget, FILE_QC_TARGET};

/// A blob mirror plus a staging directory, both temporary.
pub(crate) struct Fixture {
    _mirror: tempfile::TempDir,
    staging: tempfile::TempDir,
    store: LocalBlobStore,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let mirror = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(mirror.path());
        Self { _mirror: mirror, staging, store }
    }

    pub(crate) fn store(&self) -> Arc<dyn BlobStore> {
        Arc::new(self.store.clone())
    }

    pub(crate) fn staging(&self) -> &Path {
        self.staging.path()
    }

    pub(crate) fn config(&self) -> QcConfig {
        QcConfig {
            staging_dir: self.staging.path().to_path_buf(),
            log_artifacts: LogArtifactPaths::in_dir(self.staging.path()),
        }
    }

    pub(crate) async fn put(&self, id: &str, filename: &str, contents: &[u8]) -> PathBuf {
        self.store.put(id, filename, contents, Some("1")).await.unwrap()
    }

    /// Publish a blob and open a `FileQcTarget` over it.
    pub(crate) async fn target(
        &self,
        id: &str,
        filename: &str,
        contents: &[u8],
        metadata: serde_json::Value,
    ) -> Arc<QcTarget> {
        self.put(id, filename, contents).await;
        let target = QcTarget::open(
            FILE_QC_TARGET,
            format!("syn://{}", id),
            to_metadata(metadata),
            self.store(),
        )
        .await
        .unwrap();
        Arc::new(target)
    }
}

pub(crate) fn to_metadata(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().unwrap_or_default()
}
