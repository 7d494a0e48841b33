//! CSV manifests.
//!
//! One row per target: a `uri` column plus any number of metadata columns,
//! which are carried into the target metadata as strings.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use dcqc_core::{Metadata, QcError, Result};
use dcqc_storage::BlobStore;
use tokio::fs;

use crate::target::{QcTarget, TargetKind};

/// Column holding the target uri.
pub const URI_COLUMN: &str = "uri";

/// One manifest row.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    /// Target uri
    pub uri: String,

    /// Remaining columns
    pub metadata: Metadata,
}

/// Parse manifest rows; duplicate uris are rejected.
pub fn parse_manifest<R: std::io::Read>(input: R) -> Result<Vec<ManifestRow>> {
    let malformed = |e: csv::Error| QcError::Configuration(format!("malformed manifest: {}", e));

    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers().map_err(malformed)?.clone();
    let uri_index = headers
        .iter()
        .position(|h| h == URI_COLUMN)
        .ok_or_else(|| QcError::Configuration(format!("manifest has no `{}` column", URI_COLUMN)))?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let mut uri = None;
        let mut metadata = Metadata::new();
        for (i, (header, value)) in headers.iter().zip(record.iter()).enumerate() {
            if i == uri_index {
                uri = Some(value.to_string());
            } else {
                metadata.insert(header.to_string(), value.into());
            }
        }

        let uri = uri.ok_or_else(|| {
            QcError::Configuration(format!("manifest row {} has no uri", rows.len() + 1))
        })?;
        if !seen.insert(uri.clone()) {
            return Err(QcError::Validation(format!("duplicate uri in manifest: {}", uri)));
        }
        rows.push(ManifestRow { uri, metadata });
    }

    tracing::debug!("Parsed {} manifest rows", rows.len());
    Ok(rows)
}

/// Read and parse a manifest file.
pub async fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<ManifestRow>> {
    let bytes = fs::read(path.as_ref()).await?;
    parse_manifest(bytes.as_slice())
}

/// Open a target for every row.
pub async fn targets_from_manifest(
    rows: Vec<ManifestRow>,
    kind: TargetKind,
    store: Arc<dyn BlobStore>,
) -> Result<Vec<QcTarget>> {
    let mut targets = Vec::with_capacity(rows.len());
    for row in rows {
        targets.push(QcTarget::open(kind, row.uri, row.metadata, Arc::clone(&store)).await?);
    }
    Ok(targets)
}
