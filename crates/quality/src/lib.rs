//! Quality control (Layer 3)
//!
//! Targets, tests, suites and the pipeline stages built on them.

#![warn(missing_docs)]

pub mod builtin;
pub mod checks;
pub mod codec;
pub mod engine;
pub mod file;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod suite;
pub mod target;

#[cfg(test)]
mod testutil;

pub use builtin::builtin_checks;
pub use checks::{Check, CheckSpec, CommandLogs, ExternalCheck, InternalCheck};
pub use codec::Decoder;
pub use engine::StageEngine;
pub use file::{FileKind, RemoteFile, SYNAPSE_FILE};
pub use manifest::{parse_manifest, read_manifest, ManifestRow};
pub use qc_test::QcTest;
pub use registry::Registry;
pub use report::{compile_reports, compile_suites};
pub use suite::{QcSuite, SuiteKind, SUITE_KINDS};
pub use target::{QcTarget, TargetKind, FILE_QC_TARGET};
