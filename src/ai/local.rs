//! Local stand-in for the remote assessment.

use async_trait::async_trait;
use std::sync::Arc;

use crate::detect::{Coordinator, Finding, Language, Severity};
use crate::score;

use super::{AiError, AiSuggestion, AugmentSource, AugmentedResult, Augmentor};

/// Confidence attached to every locally derived suggestion.
pub const LOCAL_CONFIDENCE: f64 = 0.9;

/// Builds an assessment by re-running the local analyzers.
#[derive(Clone)]
pub struct LocalAugmentor {
    coordinator: Arc<Coordinator>,
}

impl LocalAugmentor {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Infallible, deterministic assessment of `source`.
    pub fn assess(&self, source: &str, language: Language) -> AugmentedResult {
        let report = self.coordinator.analyze(source, language);
        let findings = report.findings();

        let summary = format!(
            "Local analysis found {} issue(s): {} critical, {} error, {} warning, {} info. Rating: {}.",
            findings.len(),
            report.count_by_severity(Severity::Critical),
            report.count_by_severity(Severity::Error),
            report.count_by_severity(Severity::Warning),
            report.count_by_severity(Severity::Info),
            report.rating()
        );

        AugmentedResult {
            quality_score: score::local_quality_score(findings),
            summary,
            suggestions: findings.iter().map(to_suggestion).collect(),
            source: AugmentSource::LocalFallback,
        }
    }
}

fn to_suggestion(finding: &Finding) -> AiSuggestion {
    let mut message = match finding.line {
        Some(line) => format!("Line {}: {}", line, finding.message),
        None => finding.message.clone(),
    };
    if let Some(ref hint) = finding.suggestion {
        message.push_str(". ");
        message.push_str(hint);
    }
    AiSuggestion {
        message,
        confidence: LOCAL_CONFIDENCE,
    }
}

#[async_trait]
impl Augmentor for LocalAugmentor {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn augment(
        &self,
        source: &str,
        language: Language,
    ) -> Result<AugmentedResult, AiError> {
        Ok(self.assess(source, language))
    }
}
