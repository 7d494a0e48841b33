//! Report compilation.

use dcqc_core::Report;

use crate::suite::QcSuite;

/// Report with one document per suite, in order.
pub fn compile_suites(suites: &mut [QcSuite]) -> Report {
    suites.iter_mut().map(QcSuite::to_document).collect()
}

/// Concatenate already compiled reports, keeping order and duplicates.
pub fn compile_reports<I>(reports: I) -> Report
where
    I: IntoIterator<Item = Report>,
{
    reports.into_iter().flatten().collect()
}
