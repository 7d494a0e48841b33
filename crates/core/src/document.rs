//! Wire documents exchanged between pipeline stages.
//!
//! Every entity document carries a `type` tag naming its concrete variant.
//! Field order is irrelevant; optional fields are omitted when absent.

use serde::{Deserialize, Serialize};

use crate::TestStatus;

/// Free-form key/value mapping (target metadata, test configuration).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A remotely stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDocument {
    /// Remote identifier
    pub uri: String,

    /// File kind tag
    #[serde(rename = "type")]
    pub kind: String,

    /// Remote version, or the unknown sentinel
    pub version: String,

    /// Remote filename, or the unknown sentinel
    pub filename: String,

    /// Kind-specific identifiers (e.g. `synapse_id`)
    #[serde(flatten)]
    pub ids: Metadata,
}

/// A QC target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDocument {
    /// Target kind tag
    #[serde(rename = "type")]
    pub kind: String,

    /// Remote identifier of the primary file
    pub uri: String,

    /// Manifest metadata, carried verbatim
    #[serde(default)]
    pub metadata: Metadata,

    /// Embedded file documents (expanded form only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileDocument>>,
}

/// A QC test, optionally with its target embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDocument {
    /// Test kind tag
    #[serde(rename = "type")]
    pub kind: String,

    /// Test-specific parameters
    #[serde(default)]
    pub config: Metadata,

    /// Priority tier (expanded form only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u32>,

    /// Test family (expanded form only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_internal_test: Option<bool>,

    /// Recorded status (expanded form only; `null` means not decided)
    #[serde(
        default,
        deserialize_with = "present_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<TestStatus>,

    /// Non-expanded target document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetDocument>,
}

/// A present `status` key is kept even when it is `null`.
fn present_status<'de, D>(deserializer: D) -> Result<Option<TestStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    TestStatus::deserialize(deserializer).map(Some)
}

/// Command prepared for an external test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDocument {
    /// Container image (or other environment identifier)
    pub execution_environment: String,

    /// Shell command to run inside that environment
    pub command_string: String,
}

/// Aggregate verdict of a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatus {
    /// Names of the tests that counted toward the verdict
    pub required_tests: Vec<String>,

    /// AND over the counted, decided tests
    pub status: bool,
}

/// A QC suite with its tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDocument {
    /// Expanded target document
    pub target: TargetDocument,

    /// Aggregate verdict
    pub summary_status: SummaryStatus,

    /// Expanded test documents without embedded targets
    pub tests: Vec<TestDocument>,
}

/// Ordered list of suite documents.
pub type Report = Vec<SuiteDocument>;
