//! JSON document files.
//!
//! Stages hand documents to each other as pretty-printed JSON files with a
//! trailing newline.

use std::path::Path;

use tokio::fs;

use super::Result;

/// Read a document from disk.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let json = fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&json)?)
}

/// Write a document to disk, creating parent directories as needed.
pub async fn write_json<T: serde::Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json.as_bytes()).await?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
