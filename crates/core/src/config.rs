//! Stage configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration shared by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcConfig {
    /// Directory where target files are staged
    pub staging_dir: PathBuf,

    /// Where external commands leave their logs
    pub log_artifacts: LogArtifactPaths,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("."),
            log_artifacts: LogArtifactPaths::default(),
        }
    }
}

/// Paths of the three artifacts written by an external execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogArtifactPaths {
    /// Standard output
    pub stdout: PathBuf,

    /// Standard error
    pub stderr: PathBuf,

    /// Exit status
    pub exit_code: PathBuf,
}

impl LogArtifactPaths {
    /// Default artifact names resolved against `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let defaults = Self::default();
        let dir = dir.as_ref();
        Self {
            stdout: dir.join(defaults.stdout),
            stderr: dir.join(defaults.stderr),
            exit_code: dir.join(defaults.exit_code),
        }
    }
}

impl Default for LogArtifactPaths {
    fn default() -> Self {
        Self {
            stdout: PathBuf::from("std_out.txt"),
            stderr: PathBuf::from("std_err.txt"),
            exit_code: PathBuf::from("exit_code.txt"),
        }
    }
}
