//! Maintainability checks: oversized functions, branchy code, overlong
//! lines and copy-pasted lines.

use crate::config::Thresholds;

use super::heuristics::{self, complexity, duplicate_lines, function_spans, long_lines};
use super::{Analyzer, Finding, Rule, Severity};

/// Flags long functions, high complexity, overlong and duplicated lines.
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    max_function_lines: usize,
    max_complexity: usize,
    max_line_length: usize,
    min_duplicate_line_length: usize,
}

impl QualityAnalyzer {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            max_function_lines: thresholds.max_function_lines,
            max_complexity: thresholds.max_complexity,
            max_line_length: thresholds.max_line_length,
            min_duplicate_line_length: thresholds.min_duplicate_line_length,
        }
    }
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new(&Thresholds::default())
    }
}

impl Analyzer for QualityAnalyzer {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn analyze(&self, source: &str) -> anyhow::Result<Vec<Finding>> {
        let total = heuristics::line_count(source);
        let mut findings = Vec::new();

        for span in function_spans(source) {
            if span.line_count > self.max_function_lines {
                findings.push(
                    Finding::new(
                        Rule::LongFunction,
                        Severity::Warning,
                        format!(
                            "function {:?} is {} lines long, exceeds maximum of {}",
                            span.name, span.line_count, self.max_function_lines
                        ),
                    )
                    .at_line(span.start_line, total)
                    .with_suggestion("Split the function into smaller, focused helpers"),
                );
            }
        }

        let score = complexity(source);
        if score > self.max_complexity {
            findings.push(
                Finding::new(
                    Rule::HighComplexity,
                    Severity::Warning,
                    format!(
                        "complexity estimate is {}, exceeds maximum of {}",
                        score, self.max_complexity
                    ),
                )
                .with_suggestion("Reduce branching with early returns or lookup tables"),
            );
        }

        let long = long_lines(source, self.max_line_length);
        if let Some(&(first, _)) = long.first() {
            findings.push(
                Finding::new(
                    Rule::OverlongLine,
                    Severity::Warning,
                    format!(
                        "{} line(s) longer than {} characters hurt readability",
                        long.len(),
                        self.max_line_length
                    ),
                )
                .at_line(first, total)
                .with_suggestion("Wrap the line or extract parts into named variables"),
            );
        }

        for dup in duplicate_lines(source, self.min_duplicate_line_length) {
            findings.push(
                Finding::new(
                    Rule::DuplicateLine,
                    Severity::Info,
                    format!(
                        "line appears {} times (first at line {})",
                        dup.occurrences, dup.first_line
                    ),
                )
                .at_line(dup.repeat_line, total)
                .with_suggestion("Extract the repeated code into a shared helper"),
            );
        }

        heuristics::sort_by_line(&mut findings);
        Ok(findings)
    }
}
