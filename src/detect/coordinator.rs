//! Analyzer coordinator: fans a request out to every analyzer and joins the
//! results into a [`Report`].

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;

use crate::config::Thresholds;
use crate::report::{Metrics, Report};

use super::heuristics;
use super::{
    AnalysisRequest, Analyzer, Finding, Language, LanguageAnalyzer, PerformanceAnalyzer,
    QualityAnalyzer, SecurityAnalyzer,
};

/// Owns the fixed analyzer set.
///
/// The language-specific analyzer is chosen per request from the request's
/// language tag and runs alongside the fixed set.
pub struct Coordinator {
    thresholds: Thresholds,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Coordinator {
    /// Create a coordinator with the stock quality, security and performance
    /// analyzers.
    pub fn new(thresholds: Thresholds) -> Self {
        let analyzers: Vec<Box<dyn Analyzer>> = vec![
            Box::new(QualityAnalyzer::new(&thresholds)),
            Box::new(SecurityAnalyzer::new()),
            Box::new(PerformanceAnalyzer::new(&thresholds)),
        ];
        Self {
            thresholds,
            analyzers,
        }
    }

    /// Create a coordinator with a custom analyzer set.
    pub fn with_analyzers(thresholds: Thresholds, analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self {
            thresholds,
            analyzers,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Names of the analyzers that would run for `language`, in join order.
    pub fn analyzer_names(&self, language: Language) -> Vec<&'static str> {
        let mut names: Vec<_> = self.analyzers.iter().map(|a| a.name()).collect();
        names.push(language.as_str());
        names
    }

    /// Run every analyzer against the request and build the report.
    ///
    /// Returns only after all analyzers have finished. An analyzer that
    /// fails or panics contributes no findings.
    pub fn run_analysis(&self, request: &AnalysisRequest) -> Report {
        let started = Instant::now();
        let source = request.source.as_str();
        let total_lines = heuristics::line_count(source);

        let language = LanguageAnalyzer::new(request.language, &self.thresholds);
        let mut set: Vec<&dyn Analyzer> = self.analyzers.iter().map(|a| a.as_ref()).collect();
        set.push(&language);

        let per_analyzer: Vec<Vec<Finding>> = set
            .par_iter()
            .map(|analyzer| run_isolated(*analyzer, source))
            .collect();

        let mut findings: Vec<Finding> = per_analyzer.into_iter().flatten().collect();
        for finding in &mut findings {
            finding.clamp_line(total_lines);
        }

        let metrics = Metrics::measure(source, started.elapsed());
        tracing::debug!(
            language = %request.language,
            findings = findings.len(),
            duration_ms = metrics.duration_ms,
            "analysis complete"
        );
        Report::new(findings, metrics)
    }

    /// Convenience wrapper for callers that only have text and a language.
    pub fn analyze(&self, source: &str, language: Language) -> Report {
        self.run_analysis(&AnalysisRequest::new(source, language, false))
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

fn run_isolated(analyzer: &dyn Analyzer, source: &str) -> Vec<Finding> {
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(source))) {
        Ok(Ok(findings)) => findings,
        Ok(Err(e)) => {
            tracing::warn!(analyzer = analyzer.name(), error = %e, "analyzer failed, ignoring");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(analyzer = analyzer.name(), "analyzer panicked, ignoring");
            Vec::new()
        }
    }
}
