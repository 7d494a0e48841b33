//! Remote file references.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcqc_core::{FileDocument, Metadata, QcError, Result, UNKNOWN};
use dcqc_storage::BlobStore;
use tokio::fs;
use tokio::sync::Mutex;

/// A kind of remote file, discriminated by its uri scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileKind {
    /// Type tag written to documents
    pub tag: &'static str,

    /// Required uri prefix
    pub prefix: &'static str,

    /// Document field holding the kind-specific id
    pub id_field: &'static str,
}

/// Files stored on Synapse, addressed as `syn://<synapse id>`.
pub const SYNAPSE_FILE: FileKind = FileKind {
    tag: "SynapseFile",
    prefix: "syn://",
    id_field: "synapse_id",
};

/// One remotely stored file.
///
/// Version and filename are resolved once, when the reference is opened.
pub struct RemoteFile {
    kind: FileKind,
    uri: String,
    id: String,
    version: String,
    filename: String,
    store: Arc<dyn BlobStore>,
    staged: Mutex<Option<PathBuf>>,
}

impl RemoteFile {
    /// Validate `uri` against `kind` and resolve its metadata.
    pub async fn open(
        kind: FileKind,
        uri: impl Into<String>,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        let uri = uri.into();
        let id = uri
            .strip_prefix(kind.prefix)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                QcError::Validation(format!(
                    "{} uri {:?} must start with {:?}",
                    kind.tag, uri, kind.prefix
                ))
            })?
            .to_string();

        let info = store.resolve(&id).await.map_err(|e| {
            QcError::StorageUnavailable(format!("cannot resolve {}: {}", uri, e))
        })?;

        Ok(Self {
            kind,
            uri,
            id,
            version: info.version.unwrap_or_else(|| UNKNOWN.to_string()),
            filename: info.filename.unwrap_or_else(|| UNKNOWN.to_string()),
            store,
            staged: Mutex::new(None),
        })
    }

    /// File kind.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Remote identifier, including the scheme prefix.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Identifier within the blob store.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remote version label.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Remote filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Where `stage` puts the local copy.
    pub fn staging_location(&self, staging_dir: impl AsRef<Path>) -> PathBuf {
        staging_dir.as_ref().join(&self.filename)
    }

    /// Last path this reference was staged to.
    pub async fn staged_path(&self) -> Option<PathBuf> {
        self.staged.lock().await.clone()
    }

    /// Ensure a local copy exists under `staging_dir`.
    ///
    /// The download lands in a scratch directory next to the destination and is
    /// then renamed into place. An existing copy is returned untouched.
    pub async fn stage(&self, staging_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let staging_dir = staging_dir.as_ref();
        let location = self.staging_location(staging_dir);

        if !fs::try_exists(&location).await? {
            fs::create_dir_all(staging_dir).await?;
            let scratch = tempfile::Builder::new()
                .prefix(".dcqc-staging-")
                .tempdir_in(staging_dir)?;

            let downloaded = self
                .store
                .download(&self.id, scratch.path())
                .await
                .map_err(|e| {
                    QcError::StorageUnavailable(format!("cannot download {}: {}", self.uri, e))
                })?;
            fs::rename(&downloaded, &location).await?;
            tracing::info!("Staged {} at {}", self.uri, location.display());
        } else {
            tracing::debug!("{} already staged at {}", self.uri, location.display());
        }

        *self.staged.lock().await = Some(location.clone());
        Ok(location)
    }

    /// Document form.
    pub fn to_document(&self) -> FileDocument {
        let mut ids = Metadata::new();
        ids.insert(self.kind.id_field.to_string(), self.id.clone().into());
        FileDocument {
            uri: self.uri.clone(),
            kind: self.kind.tag.to_string(),
            version: self.version.clone(),
            filename: self.filename.clone(),
            ids,
        }
    }
}

impl std::fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFile")
            .field("kind", &self.kind.tag)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}
