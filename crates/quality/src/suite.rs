//! QC suites.
//!
//! A suite kind is a row of data: its parent, the checks it adds and the file
//! extensions it accepts. The tests of a kind are the parent's tests followed
//! by its own, so more specific kinds only ever add checks.

use std::sync::Arc;

use dcqc_core::{Metadata, QcError, Result, SuiteDocument, SummaryStatus};

use crate::builtin::{FILE_EXTENSION, FILE_EXTENSIONS_KEY, LIB_TIFF_INFO, MD5_CHECKSUM, OME_XML_SCHEMA};
use crate::qc_test::QcTest;
use crate::registry::Registry;
use crate::target::QcTarget;

/// Tiers up to this one count toward the verdict by default.
pub const DEFAULT_REQUIRED_TIER: u32 = 2;

/// How a suite configures one of its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultConfig {
    /// No parameters
    Empty,
    /// `file_extensions` from the most specific suite kind
    FileExtensions,
}

/// One planned test of a suite kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteEntry {
    /// Check tag
    pub check: &'static str,
    /// Configuration source
    pub config: DefaultConfig,
}

/// A kind of suite.
#[derive(Debug, PartialEq, Eq)]
pub struct SuiteKind {
    /// Suite name
    pub name: &'static str,
    /// Declared file type selecting this kind
    pub file_type: &'static str,
    /// Accepted filename suffixes
    pub file_extensions: &'static [&'static str],
    /// Kind whose tests come first
    pub parent: Option<&'static SuiteKind>,
    /// Tests added by this kind
    pub entries: &'static [SuiteEntry],
}

/// Generic files: extension and checksum.
pub static FILE_QC_SUITE: SuiteKind = SuiteKind {
    name: "FileQcSuite",
    file_type: "txt",
    file_extensions: &[".txt"],
    parent: None,
    entries: &[
        SuiteEntry { check: FILE_EXTENSION, config: DefaultConfig::FileExtensions },
        SuiteEntry { check: MD5_CHECKSUM, config: DefaultConfig::Empty },
    ],
};

/// TIFF images.
pub static TIFF_QC_SUITE: SuiteKind = SuiteKind {
    name: "TiffQcSuite",
    file_type: "tif",
    file_extensions: &[".tif", ".tiff"],
    parent: Some(&FILE_QC_SUITE),
    entries: &[SuiteEntry { check: LIB_TIFF_INFO, config: DefaultConfig::Empty }],
};

/// OME-TIFF images with embedded OME-XML.
pub static OME_TIFF_QC_SUITE: SuiteKind = SuiteKind {
    name: "OmeTiffQcSuite",
    file_type: "ome.tif",
    file_extensions: &[".ome.tif", ".ome.tiff"],
    parent: Some(&TIFF_QC_SUITE),
    entries: &[SuiteEntry { check: OME_XML_SCHEMA, config: DefaultConfig::Empty }],
};

/// Every suite kind, in lookup order.
pub static SUITE_KINDS: [&SuiteKind; 3] = [&FILE_QC_SUITE, &TIFF_QC_SUITE, &OME_TIFF_QC_SUITE];

impl SuiteKind {
    /// Kind for a declared file type; unknown types get the generic kind.
    pub fn for_file_type(file_type: &str) -> &'static SuiteKind {
        SUITE_KINDS
            .iter()
            .copied()
            .find(|kind| kind.file_type == file_type)
            .unwrap_or(&FILE_QC_SUITE)
    }

    /// Planned tests, inherited ones first.
    pub fn plan(&self) -> Vec<SuiteEntry> {
        let mut plan = self.parent.map(|parent| parent.plan()).unwrap_or_default();
        plan.extend_from_slice(self.entries);
        plan
    }

    fn config_for(&self, source: DefaultConfig) -> Metadata {
        let mut config = Metadata::new();
        if source == DefaultConfig::FileExtensions {
            config.insert(FILE_EXTENSIONS_KEY.to_string(), self.file_extensions.into());
        }
        config
    }
}

/// The tests of one target plus their aggregate verdict.
#[derive(Debug)]
pub struct QcSuite {
    kind: &'static SuiteKind,
    target: Arc<QcTarget>,
    tests: Vec<QcTest>,
    required_tests: Option<Vec<String>>,
}

impl QcSuite {
    /// Plan the suite for the target's declared file type.
    pub fn from_target(target: Arc<QcTarget>, registry: &Registry) -> Result<Self> {
        let kind = SuiteKind::for_file_type(target.file_type()?);
        let tests = kind
            .plan()
            .into_iter()
            .map(|entry| {
                let check = registry.check(entry.check)?;
                QcTest::new(check, Arc::clone(&target), kind.config_for(entry.config))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("{} for {}: {} tests", kind.name, target.name(), tests.len());
        Ok(Self {
            kind,
            target,
            tests,
            required_tests: None,
        })
    }

    /// Reassemble a suite from independently executed tests.
    ///
    /// Every test must be bound to the same target name.
    pub fn from_tests(tests: Vec<QcTest>, registry: &Registry) -> Result<Self> {
        let first = tests
            .first()
            .ok_or_else(|| QcError::Validation("cannot build a suite from zero tests".to_string()))?;
        let target = Arc::clone(first.target());

        if let Some(stray) = tests.iter().find(|t| t.target().name() != target.name()) {
            return Err(QcError::Validation(format!(
                "{} is bound to target {}, expected {}",
                stray.name(),
                stray.target().name(),
                target.name()
            )));
        }

        let mut suite = Self::from_target(target, registry)?;
        suite.tests = tests;
        Ok(suite)
    }

    /// Use an explicit set of required tests instead of the tier default.
    pub fn with_required_tests<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tests = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Suite kind.
    pub fn kind(&self) -> &'static SuiteKind {
        self.kind
    }

    /// Target under test.
    pub fn target(&self) -> &Arc<QcTarget> {
        &self.target
    }

    /// Tests, in plan order.
    pub fn tests(&self) -> &[QcTest] {
        &self.tests
    }

    /// Tests, mutably (for running them in place).
    pub fn tests_mut(&mut self) -> &mut [QcTest] {
        &mut self.tests
    }

    /// Names of the tests, in order.
    pub fn test_names(&self) -> Vec<&'static str> {
        self.tests.iter().map(QcTest::name).collect()
    }

    /// Required tests, once explicit or frozen.
    pub fn required_tests(&self) -> Option<&[String]> {
        self.required_tests.as_deref()
    }

    /// Aggregate verdict.
    ///
    /// AND over required tests that have a decided status. Undecided tests are
    /// skipped, so a required test whose stage never completed does not fail
    /// the suite. Without explicit required tests, the first call freezes the
    /// set to the decided tests of tier <= 2.
    pub fn status(&mut self) -> bool {
        let mut summary = true;
        let mut counted = Vec::new();

        for test in &self.tests {
            let required = match &self.required_tests {
                Some(names) => names.iter().any(|n| n == test.name()),
                None => test.tier() <= DEFAULT_REQUIRED_TIER,
            };
            if let (true, Some(passed)) = (required, test.status().passed()) {
                summary &= passed;
                counted.push(test.name().to_string());
            }
        }

        if self.required_tests.is_none() {
            tracing::debug!("Froze required tests for {}: {:?}", self.target.name(), counted);
            self.required_tests = Some(counted);
        }
        summary
    }

    /// Document form (freezes the required tests if needed).
    pub fn to_document(&mut self) -> SuiteDocument {
        let status = self.status();
        SuiteDocument {
            target: self.target.to_document(true),
            summary_status: SummaryStatus {
                required_tests: self.required_tests.clone().unwrap_or_default(),
                status,
            },
            tests: self.tests.iter().map(|t| t.to_document(true, false)).collect(),
        }
    }
}
