//! Check abstraction.
//!
//! A check is the stateless behaviour behind a QC test. Internal checks run in
//! this process; external checks only describe a command for some other
//! execution environment and later judge the logs it left behind.

use std::sync::Arc;

use async_trait::async_trait;
use dcqc_core::{CommandDocument, LogArtifactPaths, Metadata, QcConfig, QcError, Result};
use tokio::fs;

use crate::target::QcTarget;

/// Identity and static configuration rules of a check.
pub trait CheckSpec: Send + Sync {
    /// Type tag, also the test name.
    fn name(&self) -> &'static str;

    /// Priority tier; tiers up to 2 are required by default.
    fn tier(&self) -> u32;

    /// Reject unusable configuration before the test is created.
    fn validate_config(&self, _config: &Metadata) -> Result<()> {
        Ok(())
    }
}

/// A check executed in-process.
#[async_trait]
pub trait InternalCheck: CheckSpec {
    /// Run against `target`, returning whether it passed.
    async fn run(&self, target: &QcTarget, config: &Metadata, settings: &QcConfig) -> Result<bool>;
}

/// A check executed out of process.
pub trait ExternalCheck: CheckSpec {
    /// Build the command without running anything.
    fn prepare(&self, target: &QcTarget, config: &Metadata) -> Result<CommandDocument>;

    /// Judge the logs of a finished execution.
    fn interpret(&self, logs: &CommandLogs) -> bool {
        logs.exit_code() == Some(0)
    }
}

/// A registered check of either family.
#[derive(Clone)]
pub enum Check {
    /// Runs in this process
    Internal(Arc<dyn InternalCheck>),
    /// Runs elsewhere
    External(Arc<dyn ExternalCheck>),
}

impl Check {
    /// Wrap an internal check.
    pub fn internal(check: impl InternalCheck + 'static) -> Self {
        Check::Internal(Arc::new(check))
    }

    /// Wrap an external check.
    pub fn external(check: impl ExternalCheck + 'static) -> Self {
        Check::External(Arc::new(check))
    }

    /// Type tag.
    pub fn name(&self) -> &'static str {
        match self {
            Check::Internal(c) => c.name(),
            Check::External(c) => c.name(),
        }
    }

    /// Priority tier.
    pub fn tier(&self) -> u32 {
        match self {
            Check::Internal(c) => c.tier(),
            Check::External(c) => c.tier(),
        }
    }

    /// Whether the check runs in this process.
    pub fn is_internal(&self) -> bool {
        matches!(self, Check::Internal(_))
    }

    /// Validate a test configuration.
    pub fn validate_config(&self, config: &Metadata) -> Result<()> {
        match self {
            Check::Internal(c) => c.validate_config(config),
            Check::External(c) => c.validate_config(config),
        }
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let family = if self.is_internal() { "Internal" } else { "External" };
        f.debug_tuple(family).field(&self.name()).finish()
    }
}

/// Logs produced by an external execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLogs {
    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Raw exit status text
    pub exit_code: String,
}

impl CommandLogs {
    /// Read all three artifacts; every one of them must exist.
    pub async fn load(paths: &LogArtifactPaths) -> Result<Self> {
        Ok(Self {
            stdout: read_artifact(&paths.stdout).await?,
            stderr: read_artifact(&paths.stderr).await?,
            exit_code: read_artifact(&paths.exit_code).await?,
        })
    }

    /// Parsed exit status, if it is an integer.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code.trim().parse().ok()
    }
}

async fn read_artifact(path: &std::path::Path) -> Result<String> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(QcError::MissingArtifact(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
