//! Tri-state test status.

use serde::{Deserialize, Serialize};

/// Outcome of a single QC test.
///
/// Serialized as `null` / `true` / `false` so documents written by any stage
/// can be read back by any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TestStatus {
    /// Not run yet (or the last attempt never finished)
    #[default]
    Unknown,
    /// Check passed
    Pass,
    /// Check failed
    Fail,
}

impl TestStatus {
    /// Status for a decided boolean outcome.
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        }
    }

    /// Whether the test has reached a verdict.
    pub fn is_decided(&self) -> bool {
        !matches!(self, TestStatus::Unknown)
    }

    /// The verdict, if any.
    pub fn passed(&self) -> Option<bool> {
        match self {
            TestStatus::Unknown => None,
            TestStatus::Pass => Some(true),
            TestStatus::Fail => Some(false),
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Unknown => "UNKNOWN",
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
        }
    }
}

impl From<Option<bool>> for TestStatus {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TestStatus::Unknown, TestStatus::from_passed)
    }
}

impl From<TestStatus> for Option<bool> {
    fn from(status: TestStatus) -> Self {
        status.passed()
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
