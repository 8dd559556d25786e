//! AI augmentation.
//!
//! An [`Augmentor`] turns source text into an [`AugmentedResult`]: a 0-100
//! quality score, a summary and a list of suggestions. Two implementations
//! exist:
//! - [`RemoteAugmentor`]: asks a chat-completion endpoint
//! - [`LocalAugmentor`]: derives the same shape from the local analyzers
//!
//! [`ResilientAugmentor`] tries a primary augmentor and silently switches to
//! the local one when it fails, so augmentation never fails a request.

mod credentials;
mod local;
pub mod prompt;
mod remote;

pub use credentials::{
    ChainedCredentials, CredentialStore, EnvCredentials, FileCredentials, StaticCredentials,
};
pub use local::LocalAugmentor;
pub use remote::RemoteAugmentor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::detect::Language;

/// Reasons an augmentation attempt can fail.
///
/// None of these reach the user: the orchestrator recovers from all of them
/// through the local fallback.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("no credential configured")]
    NoCredential,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("completion endpoint returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Which implementation produced an [`AugmentedResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentSource {
    Remote,
    LocalFallback,
}

/// A single AI-sourced suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub message: String,
    /// In `[0, 1]`.
    pub confidence: f64,
}

/// Outcome of an augmentation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedResult {
    /// In `0..=100`.
    pub quality_score: u8,
    pub summary: String,
    pub suggestions: Vec<AiSuggestion>,
    pub source: AugmentSource,
}

/// Produces a quality assessment for a piece of source text.
#[async_trait]
pub trait Augmentor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn augment(&self, source: &str, language: Language)
        -> Result<AugmentedResult, AiError>;
}

/// Tries `primary`, and falls back to the local augmentor on any error.
pub struct ResilientAugmentor {
    primary: Arc<dyn Augmentor>,
    fallback: LocalAugmentor,
}

impl ResilientAugmentor {
    pub fn new(primary: Arc<dyn Augmentor>, fallback: LocalAugmentor) -> Self {
        Self { primary, fallback }
    }

    /// Always produces a result.
    pub async fn assess(&self, source: &str, language: Language) -> AugmentedResult {
        select(
            self.primary.name(),
            self.primary.augment(source, language).await,
            || self.fallback.assess(source, language),
        )
    }
}

/// Keep the primary result, or compute the fallback when it failed.
fn select(
    primary: &str,
    outcome: Result<AugmentedResult, AiError>,
    fallback: impl FnOnce() -> AugmentedResult,
) -> AugmentedResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(augmentor = primary, error = %e, "AI augmentation failed, using local fallback");
            fallback()
        }
    }
}

#[async_trait]
impl Augmentor for ResilientAugmentor {
    fn name(&self) -> &'static str {
        "resilient"
    }

    async fn augment(
        &self,
        source: &str,
        language: Language,
    ) -> Result<AugmentedResult, AiError> {
        Ok(self.assess(source, language).await)
    }
}
