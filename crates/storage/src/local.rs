//! Directory-backed blob store.
//!
//! Each blob lives in `<root>/<id>/`: exactly one data file, named after the
//! blob's filename, plus an optional `.version` marker holding the version label.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{BlobInfo, BlobStore, Result, StorageError};

const VERSION_MARKER: &str = ".version";

/// Blob store reading from a local mirror directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store over an existing mirror directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root of the mirror.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Publish a blob into the mirror, replacing any previous content.
    pub async fn put(
        &self,
        id: &str,
        filename: &str,
        contents: &[u8],
        version: Option<&str>,
    ) -> Result<PathBuf> {
        let dir = self.entry_dir(id)?;
        if fs::try_exists(&dir).await? {
            fs::remove_dir_all(&dir).await?;
        }
        fs::create_dir_all(&dir).await?;

        let path = dir.join(filename);
        fs::write(&path, contents).await?;
        if let Some(version) = version {
            fs::write(dir.join(VERSION_MARKER), version.as_bytes()).await?;
        }
        Ok(path)
    }

    fn entry_dir(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(StorageError::Other(format!("Invalid blob id: {:?}", id)));
        }
        Ok(self.root.join(id))
    }

    async fn data_file(&self, id: &str) -> Result<PathBuf> {
        let dir = self.entry_dir(id)?;
        let mut rd = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type().await?.is_file() {
                candidates.push(entry.path());
            }
        }

        match candidates.len() {
            0 => Err(StorageError::NotFound(id.to_string())),
            1 => Ok(candidates.remove(0)),
            n => Err(StorageError::Other(format!(
                "Blob {} holds {} data files, expected one",
                id, n
            ))),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn resolve(&self, id: &str) -> Result<BlobInfo> {
        let path = self.data_file(id).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let version = match fs::read_to_string(self.entry_dir(id)?.join(VERSION_MARKER)).await {
            Ok(s) => Some(s.trim().to_string()).filter(|v| !v.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Resolved blob {}: {:?} (version {:?})", id, filename, version);
        Ok(BlobInfo { version, filename })
    }

    async fn download(&self, id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let source = self.data_file(id).await?;
        let name = source
            .file_name()
            .ok_or_else(|| StorageError::Other(format!("Blob {} has no filename", id)))?;
        let dest = dest_dir.join(name);
        fs::copy(&source, &dest).await?;
        tracing::debug!("Downloaded blob {} to {}", id, dest.display());
        Ok(dest)
    }
}
