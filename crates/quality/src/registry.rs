//! Type-tag registry.
//!
//! Documents name their concrete variant with a `type` tag. Decoding resolves
//! that tag here; the table is built once per process and passed around
//! explicitly.

use std::collections::HashMap;

use dcqc_core::{QcError, Result};

use crate::builtin::builtin_checks;
use crate::checks::Check;
use crate::file::{FileKind, SYNAPSE_FILE};
use crate::target::{TargetKind, FILE_QC_TARGET};

/// Registry of target, file and check kinds.
pub struct Registry {
    targets: HashMap<&'static str, TargetKind>,
    files: HashMap<&'static str, FileKind>,
    checks: HashMap<&'static str, Check>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
            files: HashMap::new(),
            checks: HashMap::new(),
        }
    }

    /// Registry holding every built-in kind.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_target(FILE_QC_TARGET);
        registry.register_file(SYNAPSE_FILE);
        for check in builtin_checks() {
            registry.register_check(check);
        }
        registry
    }

    /// Register a target kind (and the file kind it wraps).
    pub fn register_target(&mut self, kind: TargetKind) {
        self.register_file(kind.file_kind);
        self.targets.insert(kind.tag, kind);
    }

    /// Register a file kind.
    pub fn register_file(&mut self, kind: FileKind) {
        self.files.insert(kind.tag, kind);
    }

    /// Register a check, replacing any check with the same tag.
    pub fn register_check(&mut self, check: Check) {
        self.checks.insert(check.name(), check);
    }

    /// Look up a target kind.
    pub fn target_kind(&self, tag: &str) -> Result<TargetKind> {
        self.targets
            .get(tag)
            .copied()
            .ok_or_else(|| QcError::UnknownType(format!("target type {:?}", tag)))
    }

    /// Look up a file kind.
    pub fn file_kind(&self, tag: &str) -> Result<FileKind> {
        self.files
            .get(tag)
            .copied()
            .ok_or_else(|| QcError::UnknownType(format!("file type {:?}", tag)))
    }

    /// Look up a check.
    pub fn check(&self, tag: &str) -> Result<Check> {
        self.checks
            .get(tag)
            .cloned()
            .ok_or_else(|| QcError::UnknownType(format!("test type {:?}", tag)))
    }

    /// Registered check names, sorted.
    pub fn check_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.checks.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
