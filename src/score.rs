//! Rating and scoring.
//!
//! Two derived numbers come out of a set of findings: the overall
//! [`Rating`] of a report, and the 0-100 quality score the local AI
//! fallback reports in place of a remote assessment.

use serde::{Deserialize, Serialize};

use crate::detect::{Finding, Severity};

/// Upper bounds (inclusive) on the number of rated findings per rating.
pub mod thresholds {
    pub const EXCELLENT_MAX: usize = 0;
    pub const GOOD_MAX: usize = 2;
    pub const NEEDS_IMPROVEMENT_MAX: usize = 5;
}

/// Points the local quality score loses per finding.
pub mod penalties {
    pub const CRITICAL: u32 = 30;
    pub const ERROR: u32 = 15;
    pub const WARNING: u32 = 5;
}

/// Overall rating of a report, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::NeedsImprovement => "needsImprovement",
            Rating::Poor => "poor",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "excellent" => Ok(Rating::Excellent),
            "good" => Ok(Rating::Good),
            "needsimprovement" => Ok(Rating::NeedsImprovement),
            "poor" => Ok(Rating::Poor),
            _ => Err(format!("unknown rating: {}", s)),
        }
    }
}

/// Map the number of warning-or-worse findings to a rating.
pub fn rating_for_count(n: usize) -> Rating {
    match n {
        n if n <= thresholds::EXCELLENT_MAX => Rating::Excellent,
        n if n <= thresholds::GOOD_MAX => Rating::Good,
        n if n <= thresholds::NEEDS_IMPROVEMENT_MAX => Rating::NeedsImprovement,
        _ => Rating::Poor,
    }
}

/// Number of findings that count toward the rating.
pub fn rated_count(findings: &[Finding]) -> usize {
    findings
        .iter()
        .filter(|f| f.severity.counts_toward_rating())
        .count()
}

/// Derive the overall rating of a set of findings.
/// Info findings never affect the rating.
pub fn rating(findings: &[Finding]) -> Rating {
    rating_for_count(rated_count(findings))
}

/// Heuristic 0-100 quality score: 100 minus a fixed penalty per warning,
/// error and critical finding, floored at zero.
pub fn local_quality_score(findings: &[Finding]) -> u8 {
    let penalty: u32 = findings
        .iter()
        .map(|f| match f.severity {
            Severity::Critical => penalties::CRITICAL,
            Severity::Error => penalties::ERROR,
            Severity::Warning => penalties::WARNING,
            Severity::Info => 0,
        })
        .sum();
    100u32.saturating_sub(penalty) as u8
}
