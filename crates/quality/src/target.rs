//! QC targets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcqc_core::{Metadata, QcError, Result, TargetDocument};
use dcqc_storage::BlobStore;

use crate::file::{FileKind, RemoteFile, SYNAPSE_FILE};

/// Metadata key selecting the suite of a target.
pub const FILE_TYPE_KEY: &str = "file_type";

/// A kind of target and the kind of file it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetKind {
    /// Type tag written to documents
    pub tag: &'static str,

    /// Kind of the primary file
    pub file_kind: FileKind,
}

/// A target made of a single file.
pub const FILE_QC_TARGET: TargetKind = TargetKind {
    tag: "FileQcTarget",
    file_kind: SYNAPSE_FILE,
};

/// A named unit under test: its files plus manifest metadata.
#[derive(Debug)]
pub struct QcTarget {
    kind: TargetKind,
    uri: String,
    name: String,
    metadata: Metadata,
    files: Vec<RemoteFile>,
}

impl QcTarget {
    /// Open the target's files and bind the metadata.
    pub async fn open(
        kind: TargetKind,
        uri: impl Into<String>,
        metadata: Metadata,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        let uri = uri.into();
        let file = RemoteFile::open(kind.file_kind, uri.clone(), store).await?;
        let name = file.id().to_string();
        tracing::debug!("Opened target {} ({})", name, uri);

        Ok(Self {
            kind,
            uri,
            name,
            metadata,
            files: vec![file],
        })
    }

    /// Target kind.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Remote identifier of the primary file.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Identity shared by every test of this target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All manifest metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// A single metadata value.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// The declared file type.
    pub fn file_type(&self) -> Result<&str> {
        self.get_metadata(FILE_TYPE_KEY)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                QcError::Configuration(format!(
                    "target {} has no `{}` metadata",
                    self.name, FILE_TYPE_KEY
                ))
            })
    }

    /// Primary file.
    pub fn file(&self) -> &RemoteFile {
        &self.files[0]
    }

    /// All owned files.
    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    /// Stage every file under `staging_dir`.
    pub async fn stage(&self, staging_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.files.len());
        for file in &self.files {
            paths.push(file.stage(staging_dir.as_ref()).await?);
        }
        Ok(paths)
    }

    /// Document form; `expanded` embeds the file documents.
    pub fn to_document(&self, expanded: bool) -> TargetDocument {
        TargetDocument {
            kind: self.kind.tag.to_string(),
            uri: self.uri.clone(),
            metadata: self.metadata.clone(),
            files: expanded.then(|| self.files.iter().map(RemoteFile::to_document).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use serde_json::json;

    #[tokio::test]
    async fn test_target_identity() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn11", "a.tif", b"x", json!({"file_type": "tif"})).await;

        assert_eq!(target.name(), "syn11");
        assert_eq!(target.uri(), "syn://syn11");
        assert_eq!(target.file_type().unwrap(), "tif");
        assert_eq!(target.get_metadata("missing"), None);
    }

    #[tokio::test]
    async fn test_file_type_required() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn11", "a.tif", b"x", json!({"file_type": ""})).await;
        assert!(matches!(target.file_type(), Err(QcError::Configuration(_))));

        let target = fixture.target("syn12", "b.tif", b"x", json!({})).await;
        assert!(matches!(target.file_type(), Err(QcError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_document_expansion() {
        let fixture = Fixture::new().await;
        let target = fixture
            .target("syn11", "a.tif", b"x", json!({"file_type": "tif", "batch": 3}))
            .await;

        let collapsed = target.to_document(false);
        assert_eq!(collapsed.kind, "FileQcTarget");
        assert!(collapsed.files.is_none());
        assert_eq!(collapsed.metadata["batch"], 3);

        let expanded = target.to_document(true);
        let files = expanded.files.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.tif");
    }

    #[tokio::test]
    async fn test_stage_all_files() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn11", "a.tif", b"x", json!({"file_type": "tif"})).await;

        let paths = target.stage(fixture.staging()).await.unwrap();
        assert_eq!(paths, vec![fixture.staging().join("a.tif")]);

        let files = target.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].staged_path().await, Some(paths[0].clone()));
    }
}
