//! Performance-risk heuristics.

use crate::config::Thresholds;

use super::heuristics::{self, complexity, long_lines};
use super::{Analyzer, Finding, Rule, Severity};

/// Flags overlong lines and heavy control flow.
///
/// Shares the keyword complexity estimate with the quality analyzer but
/// applies its own, higher threshold.
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    max_line_length: usize,
    heavy_computation_complexity: usize,
}

impl PerformanceAnalyzer {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            max_line_length: thresholds.max_line_length,
            heavy_computation_complexity: thresholds.heavy_computation_complexity,
        }
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(&Thresholds::default())
    }
}

impl Analyzer for PerformanceAnalyzer {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn analyze(&self, source: &str) -> anyhow::Result<Vec<Finding>> {
        let total = heuristics::line_count(source);
        let mut findings = Vec::new();

        let long = long_lines(source, self.max_line_length);
        if let Some(&(first, _)) = long.first() {
            let longest = long.iter().map(|&(_, len)| len).max().unwrap_or(0);
            findings.push(
                Finding::new(
                    Rule::LongLine,
                    Severity::Warning,
                    format!(
                        "{} line(s) exceed {} characters (longest is {})",
                        long.len(),
                        self.max_line_length,
                        longest
                    ),
                )
                .at_line(first, total)
                .with_suggestion("Break long expressions into named intermediate values"),
            );
        }

        let score = complexity(source);
        if score > self.heavy_computation_complexity {
            findings.push(
                Finding::new(
                    Rule::HeavyComputation,
                    Severity::Warning,
                    format!(
                        "heavy computation: complexity estimate {} exceeds {}",
                        score, self.heavy_computation_complexity
                    ),
                )
                .with_suggestion("Look for nested loops that can be flattened or cached"),
            );
        }

        heuristics::sort_by_line(&mut findings);
        Ok(findings)
    }
}
