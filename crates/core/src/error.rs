//! Error taxonomy shared by every stage.

/// Result type for QC operations.
pub type Result<T> = std::result::Result<T, QcError>;

/// Errors raised while building, decoding or running QC entities.
///
/// Nothing is retried internally; the invoking stage decides what to do.
#[derive(Debug, thiserror::Error)]
pub enum QcError {
    /// A required configuration key is missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An identifier or a composition of entities is invalid
    #[error("validation error: {0}")]
    Validation(String),

    /// The blob store could not resolve or deliver a file
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A log artifact of an external test is absent
    #[error("missing artifact: {0}")]
    MissingArtifact(String),

    /// A document carries a type tag that is not registered
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The operation does not belong to this test's family
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
