//! Static analysis: the finding vocabulary, the analyzers and the
//! coordinator that runs them.

mod analyzer;
mod coordinator;
pub mod heuristics;
mod language;
mod performance;
mod quality;
mod security;
mod types;

pub use analyzer::Analyzer;
pub use coordinator::Coordinator;
pub use language::LanguageAnalyzer;
pub use performance::PerformanceAnalyzer;
pub use quality::QualityAnalyzer;
pub use security::SecurityAnalyzer;
pub use types::{AnalysisRequest, Category, Finding, Language, Rule, Severity};
