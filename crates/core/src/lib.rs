//! dcqc core data models.
//!
//! This crate defines the documents exchanged between QC pipeline stages,
//! the tri-state test status, the error taxonomy and stage configuration.

#![warn(missing_docs)]

mod config;
mod document;
mod error;
mod status;

pub use config::{LogArtifactPaths, QcConfig};
pub use document::{
    CommandDocument, FileDocument, Metadata, Report, SuiteDocument, SummaryStatus,
    TargetDocument, TestDocument,
};
pub use error::{QcError, Result};
pub use status::TestStatus;

/// Sentinel for remote metadata that could not be resolved.
pub const UNKNOWN: &str = "unknown";
