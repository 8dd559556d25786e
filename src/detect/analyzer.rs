//! The analyzer capability.

use super::Finding;

/// Inspects source text and reports findings.
///
/// # Contract
///
/// Implementations must be a pure function of the text they are given: no
/// shared mutable state and no I/O. The coordinator runs every analyzer of a
/// request in parallel, and treats an `Err` (or a panic) as "this analyzer
/// found nothing" rather than failing the whole request.
///
/// Findings should be returned in source-line order, with line numbers
/// clamped to the analyzed text (see [`Finding::at_line`]).
pub trait Analyzer: Send + Sync {
    /// Short identifier used in logs (e.g. "quality", "security").
    fn name(&self) -> &'static str;

    /// Analyze the given source text.
    fn analyze(&self, source: &str) -> anyhow::Result<Vec<Finding>>;
}
