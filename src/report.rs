//! Analysis reports and their output formats.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::{AugmentSource, AugmentedResult};
use crate::detect::{heuristics, Category, Finding, Severity};
use crate::fix::Fix;
use crate::score::{self, Rating};

/// Facts about the analyzed text, computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub characters: usize,
    pub lines: usize,
    /// Weighted branching/loop keyword count.
    pub complexity: usize,
    /// Wall-clock time spent in the analyzers.
    pub duration_ms: u64,
}

impl Metrics {
    pub fn measure(source: &str, elapsed: Duration) -> Self {
        Self {
            characters: source.chars().count(),
            lines: heuristics::line_count(source),
            complexity: heuristics::complexity(source),
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

/// The result of one analysis request.
///
/// Findings, metrics and rating are fixed at construction. An AI assessment
/// can be attached afterwards with [`Report::with_augmentation`], which
/// never touches the base data.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    findings: Vec<Finding>,
    metrics: Metrics,
    rating: Rating,
    ai: Option<AugmentedResult>,
}

impl Report {
    /// Build a report, deriving the rating from the findings.
    pub fn new(findings: Vec<Finding>, metrics: Metrics) -> Self {
        let rating = score::rating(&findings);
        Self {
            findings,
            metrics,
            rating,
            ai: None,
        }
    }

    /// Attach an AI assessment, replacing any previous one.
    pub fn with_augmentation(self, ai: AugmentedResult) -> Self {
        Self {
            ai: Some(ai),
            ..self
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn ai(&self) -> Option<&AugmentedResult> {
        self.ai.as_ref()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.findings
            .iter()
            .filter(|f| f.category == category)
            .count()
    }

    /// Findings ordered most severe first, then by line.
    pub fn sorted_by_severity(&self) -> Vec<&Finding> {
        let mut sorted: Vec<&Finding> = self.findings.iter().collect();
        sorted.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.line.unwrap_or(usize::MAX).cmp(&b.line.unwrap_or(usize::MAX)))
        });
        sorted
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Stable JSON document for a report.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub rating: Rating,
    pub metrics: Metrics,
    pub summary: JsonSummary,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AugmentedResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<Fix>,
}

/// Finding counts per severity.
#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

/// Render a report as pretty-printed JSON.
pub fn to_json(path: &str, report: &Report, fixes: &[Fix]) -> anyhow::Result<String> {
    let doc = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        rating: report.rating(),
        metrics: *report.metrics(),
        summary: JsonSummary {
            critical: report.count_by_severity(Severity::Critical),
            error: report.count_by_severity(Severity::Error),
            warning: report.count_by_severity(Severity::Warning),
            info: report.count_by_severity(Severity::Info),
        },
        findings: report.sorted_by_severity().into_iter().cloned().collect(),
        ai: report.ai().cloned(),
        fixes: fixes.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Write a report to stdout in JSON format.
pub fn write_json(path: &str, report: &Report, fixes: &[Fix]) -> anyhow::Result<()> {
    println!("{}", to_json(path, report, fixes)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a report to stdout in pretty (human-readable) format.
pub fn write_pretty(path: &str, report: &Report, fixes: &[Fix]) {
    // Header
    println!();
    print!("  ");
    print!("{}", "codereview".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Analyzing: ".dimmed());
    println!("{}", path);
    let m = report.metrics();
    println!(
        "  {}",
        format!(
            "{} lines, {} chars, complexity {}, {} ms",
            m.lines, m.characters, m.complexity, m.duration_ms
        )
        .dimmed()
    );
    println!();

    write_rating_summary(report);
    println!();

    if !report.findings().is_empty() {
        write_findings(&report.sorted_by_severity());
        println!();
    }

    if let Some(ai) = report.ai() {
        write_ai_section(ai);
        println!();
    }

    if !fixes.is_empty() {
        write_fixes(fixes);
        println!();
    }
}

fn write_rating_summary(report: &Report) {
    print!("  Rating: ");
    write_colored_rating(report.rating());

    let counts = [
        (Severity::Critical, "critical"),
        (Severity::Error, "error"),
        (Severity::Warning, "warning"),
        (Severity::Info, "info"),
    ];
    let parts: Vec<String> = counts
        .iter()
        .map(|(sev, label)| format!("{} {}", report.count_by_severity(*sev), label))
        .collect();
    print!("  {}", format!("({})", parts.join(", ")).dimmed());
    println!();
}

fn write_colored_rating(rating: Rating) {
    let label = rating.as_str();
    match rating {
        Rating::Excellent => print!("{}", label.green().bold()),
        Rating::Good => print!("{}", label.green()),
        Rating::NeedsImprovement => print!("{}", label.yellow()),
        Rating::Poor => print!("{}", label.red().bold()),
    }
}

fn write_findings(findings: &[&Finding]) {
    println!("  {} ({}):", "Findings".bold(), findings.len());
    println!();

    for f in findings {
        write_severity_tag(&f.severity);
        print!("   ");
        print!("{:<24}", f.rule.as_str().dimmed());
        print!("{}", f.category.to_string().blue());
        if let Some(line) = f.line {
            print!("{}", format!(":{}", line).dimmed());
        }
        println!();

        // Message on next line, indented
        println!("            {}", f.message);
        if let Some(ref suggestion) = f.suggestion {
            println!("            {}", format!("→ {}", suggestion).dimmed());
        }
        println!();
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Critical => print!("    {} ", "CRIT ".red().bold()),
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_ai_section(ai: &AugmentedResult) {
    let source = match ai.source {
        AugmentSource::Remote => "remote",
        AugmentSource::LocalFallback => "local fallback",
    };
    println!(
        "  {} {}",
        "AI assessment".bold(),
        format!("({})", source).dimmed()
    );
    println!("    Quality score: {}", ai.quality_score);
    if !ai.summary.is_empty() {
        println!("    {}", ai.summary);
    }
    for s in &ai.suggestions {
        println!(
            "    - {} {}",
            s.message,
            format!("[{:.0}%]", s.confidence * 100.0).dimmed()
        );
    }
}

fn write_fixes(fixes: &[Fix]) {
    println!("  {} ({}):", "Available fixes".bold(), fixes.len());
    for fix in fixes {
        println!("    {:<28} {}", fix.id.cyan(), fix.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiSuggestion;
    use crate::detect::Rule;

    fn metrics() -> Metrics {
        Metrics {
            characters: 10,
            lines: 3,
            complexity: 0,
            duration_ms: 1,
        }
    }

    fn sample_report() -> Report {
        Report::new(
            vec![
                Finding::new(Rule::DuplicateLine, Severity::Info, "dup").at_line(3, 3),
                Finding::new(Rule::JsVar, Severity::Warning, "var").at_line(2, 3),
                Finding::new(Rule::HighComplexity, Severity::Warning, "complex"),
                Finding::new(Rule::DynamicEval, Severity::Critical, "eval").at_line(3, 3),
            ],
            metrics(),
        )
    }

    #[test]
    fn test_rating_derived_at_construction() {
        let report = sample_report();
        assert_eq!(report.rating(), Rating::NeedsImprovement);
        assert_eq!(report.count_by_severity(Severity::Warning), 2);
        assert_eq!(report.count_by_category(Category::Security), 1);
    }

    #[test]
    fn test_sorted_by_severity() {
        let report = sample_report();
        let rules: Vec<Rule> = report.sorted_by_severity().iter().map(|f| f.rule).collect();
        assert_eq!(
            rules,
            vec![
                Rule::DynamicEval,
                Rule::JsVar,
                Rule::HighComplexity,
                Rule::DuplicateLine
            ]
        );
    }

    #[test]
    fn test_augmentation_keeps_base_data() {
        let report = sample_report();
        let before = (report.findings().to_vec(), *report.metrics(), report.rating());

        let ai = AugmentedResult {
            quality_score: 42,
            summary: "meh".to_string(),
            suggestions: vec![AiSuggestion {
                message: "rename things".to_string(),
                confidence: 0.5,
            }],
            source: AugmentSource::Remote,
        };
        let augmented = report.with_augmentation(ai.clone());

        assert_eq!(augmented.findings(), before.0.as_slice());
        assert_eq!(*augmented.metrics(), before.1);
        assert_eq!(augmented.rating(), before.2);
        assert_eq!(augmented.ai(), Some(&ai));
    }

    #[test]
    fn test_json_document() {
        let json = to_json("sample.js", &sample_report(), &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rating"], "needsImprovement");
        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["findings"][0]["rule"], "dynamic_eval");
        assert_eq!(value["findings"][0]["category"], "security");
        assert_eq!(value["metrics"]["lines"], 3);
        assert!(value.get("ai").is_none());
        assert!(value.get("fixes").is_none());
    }

    #[test]
    fn test_metrics_measure() {
        let m = Metrics::measure("for x in y {\n}\n", Duration::from_millis(7));
        assert_eq!(m.lines, 2);
        assert_eq!(m.complexity, 1);
        assert_eq!(m.characters, 15);
        assert_eq!(m.duration_ms, 7);
    }
}
