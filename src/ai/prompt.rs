//! Prompt construction and response parsing for the completion endpoint.

use serde::Deserialize;

use crate::detect::Language;

use super::{AiSuggestion, AugmentSource, AugmentedResult};

/// Quality score used when the response is not the expected JSON.
pub const UNSTRUCTURED_SCORE: u8 = 75;

/// Confidence of the single suggestion carrying an unstructured response.
pub const UNSTRUCTURED_CONFIDENCE: f64 = 0.7;

/// Confidence assumed for suggestions that omit one.
const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const SYSTEM_PROMPT: &str = "You are a senior code reviewer. Assess code quality, security \
and performance. Respond with a single JSON object and nothing else.";

/// Build the user message embedding the source and its language.
pub fn user_prompt(source: &str, language: Language) -> String {
    format!(
        "Review the following {language} code.\n\n\
         Respond with JSON of the form:\n\
         {{\"quality_score\": <0-100>, \"summary\": \"<one paragraph>\", \
         \"suggestions\": [{{\"message\": \"<text>\", \"confidence\": <0-1>}}]}}\n\n\
         ```{language}\n{source}\n```"
    )
}

#[derive(Deserialize)]
struct RawAssessment {
    quality_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    message: String,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Interpret the completion text.
///
/// JSON content is mapped field by field, with the score clamped to
/// `0..=100` and confidences to `[0, 1]`. Anything else becomes the summary
/// of an assessment with a fixed score and one suggestion holding the text.
pub fn parse_assessment(content: &str) -> AugmentedResult {
    match serde_json::from_str::<RawAssessment>(strip_code_fence(content)) {
        Ok(raw) => AugmentedResult {
            quality_score: raw.quality_score.round().clamp(0.0, 100.0) as u8,
            summary: raw.summary,
            suggestions: raw
                .suggestions
                .into_iter()
                .map(|s| AiSuggestion {
                    message: s.message,
                    confidence: s.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
                })
                .collect(),
            source: AugmentSource::Remote,
        },
        Err(e) => {
            tracing::debug!(error = %e, "completion is not structured JSON, keeping raw text");
            AugmentedResult {
                quality_score: UNSTRUCTURED_SCORE,
                summary: content.to_string(),
                suggestions: vec![AiSuggestion {
                    message: content.to_string(),
                    confidence: UNSTRUCTURED_CONFIDENCE,
                }],
                source: AugmentSource::Remote,
            }
        }
    }
}
