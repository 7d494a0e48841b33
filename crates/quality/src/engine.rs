//! Pipeline stages.
//!
//! Each stage reads documents from disk, does one step and writes its result
//! back as a document. Stages share no memory; an orchestrator runs them as
//! separate invocations, possibly in parallel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcqc_core::{CommandDocument, QcConfig, Report, Result, TargetDocument, TestDocument, TestStatus};
use dcqc_storage::{read_json, write_json, BlobStore};
use tokio::fs;
use tracing::info;

use crate::codec::Decoder;
use crate::manifest::{read_manifest, targets_from_manifest};
use crate::qc_test::QcTest;
use crate::registry::Registry;
use crate::report::{compile_reports, compile_suites};
use crate::suite::QcSuite;
use crate::target::{QcTarget, FILE_QC_TARGET};

/// Runs pipeline stages against a blob store.
pub struct StageEngine {
    registry: Registry,
    store: Arc<dyn BlobStore>,
    config: QcConfig,
}

impl StageEngine {
    /// Create an engine with the built-in registry.
    pub fn new(store: Arc<dyn BlobStore>, config: QcConfig) -> Self {
        Self {
            registry: Registry::builtin(),
            store,
            config,
        }
    }

    /// Replace the registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Registry in use.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configuration in use.
    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    fn decoder(&self) -> Decoder<'_> {
        Decoder::new(&self.registry, Arc::clone(&self.store))
    }

    async fn load_target(&self, path: &Path) -> Result<Arc<QcTarget>> {
        let doc: TargetDocument = read_json(path).await?;
        self.decoder().target(&doc).await
    }

    async fn load_test(&self, path: &Path) -> Result<QcTest> {
        let doc: TestDocument = read_json(path).await?;
        self.decoder().test(&doc).await
    }

    /// Write one collapsed target document per manifest row.
    pub async fn prepare_targets(&self, manifest: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let rows = read_manifest(manifest).await?;
        fs::create_dir_all(output_dir).await?;
        let targets = targets_from_manifest(rows, FILE_QC_TARGET, Arc::clone(&self.store)).await?;

        let mut written = Vec::with_capacity(targets.len());
        for target in &targets {
            let path = output_dir.join(format!("{}.json", target.name()));
            write_json(&target.to_document(false), &path).await?;
            written.push(path);
        }
        info!("Prepared {} targets in {}", written.len(), output_dir.display());
        Ok(written)
    }

    /// Stage the files of a target.
    pub async fn stage_target(&self, target_json: &Path, staging_dir: &Path) -> Result<Vec<PathBuf>> {
        let target = self.load_target(target_json).await?;
        let staged = target.stage(staging_dir).await?;
        info!("Staged {} file(s) for {}", staged.len(), target.name());
        Ok(staged)
    }

    /// Write one test document per test of the target's suite.
    pub async fn prepare_tests(&self, target_json: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let target = self.load_target(target_json).await?;
        fs::create_dir_all(output_dir).await?;
        let suite = QcSuite::from_target(Arc::clone(&target), &self.registry)?;

        let mut written = Vec::with_capacity(suite.tests().len());
        for test in suite.tests() {
            let path = output_dir.join(format!("{}.{}.json", target.name(), test.name()));
            write_json(&test.to_document(true, true), &path).await?;
            written.push(path);
        }
        info!("Prepared {} tests for {} ({})", written.len(), target.name(), suite.kind().name);
        Ok(written)
    }

    /// Write the command document of an external test.
    pub async fn prepare_cmd(&self, test_json: &Path, command_path: &Path) -> Result<CommandDocument> {
        let test = self.load_test(test_json).await?;
        let command = test.prepare_cmd()?;
        write_json(&command, command_path).await?;
        info!("Prepared command for {} on {}", test.name(), test.target().name());
        Ok(command)
    }

    /// Run an internal test and write the updated test document.
    pub async fn run_test(&self, test_json: &Path, output: &Path) -> Result<TestStatus> {
        let mut test = self.load_test(test_json).await?;
        let status = test.run(&self.config).await?;
        write_json(&test.to_document(true, true), output).await?;
        Ok(status)
    }

    /// Interpret the logs of an external test and write the updated document.
    pub async fn interpret_cmd(&self, test_json: &Path, output: &Path) -> Result<TestStatus> {
        let mut test = self.load_test(test_json).await?;
        let status = test.interpret_cmd(&self.config.log_artifacts).await?;
        write_json(&test.to_document(true, true), output).await?;
        Ok(status)
    }

    /// Reassemble one target's tests into a suite and write a single-suite report.
    pub async fn target_report(&self, report_path: &Path, test_jsons: &[PathBuf]) -> Result<bool> {
        let mut decoder = self.decoder();
        let mut tests = Vec::with_capacity(test_jsons.len());
        for path in test_jsons {
            let doc: TestDocument = read_json(path).await?;
            tests.push(decoder.test(&doc).await?);
        }

        let mut suite = QcSuite::from_tests(tests, &self.registry)?;
        let report = compile_suites(std::slice::from_mut(&mut suite));
        let status = report.first().map_or(true, |s| s.summary_status.status);
        write_json(&report, report_path).await?;
        info!("Report for {}: {}", suite.target().name(), if status { "PASS" } else { "FAIL" });
        Ok(status)
    }

    /// Concatenate compiled reports.
    pub async fn compile_reports(&self, output: &Path, reports: &[PathBuf]) -> Result<usize> {
        let mut loaded = Vec::with_capacity(reports.len());
        for path in reports {
            let report: Report = read_json(path).await?;
            loaded.push(report);
        }
        let compiled = compile_reports(loaded);
        write_json(&compiled, output).await?;
        info!("Compiled {} suites into {}", compiled.len(), output.display());
        Ok(compiled.len())
    }
}
