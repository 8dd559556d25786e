//! Chat-completion client.
//!
//! Sends: POST {endpoint} with `Authorization: Bearer <credential>` and
//! `{model, messages, max_tokens, temperature}`, and reads
//! `choices[0].message.content` from a 200 response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AiConfig;
use crate::detect::Language;

use super::prompt::{self, SYSTEM_PROMPT};
use super::{AiError, AugmentedResult, Augmentor, CredentialStore};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Calls a remote completion endpoint.
pub struct RemoteAugmentor {
    http: Client,
    config: AiConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl RemoteAugmentor {
    pub fn new(config: AiConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let http = Client::builder()
            .user_agent(concat!("codereview/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            credentials,
        }
    }

    fn request_body(&self, source: &str, language: Language) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt::user_prompt(source, language),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Send the request and return the raw completion text.
    async fn complete(&self, source: &str, language: Language) -> Result<String, AiError> {
        let credential = self.credentials.get_credential()?;
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(credential)
            .timeout(timeout)
            .json(&self.request_body(source, language))
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status().as_u16() {
            200 => {}
            status => return Err(AiError::Status(status)),
        }

        let body = response.text().await.map_err(map_transport_error)?;
        extract_content(&body)
    }
}

fn map_transport_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::Network(e)
    }
}

/// Pull `choices[0].message.content` out of a response body.
fn extract_content(body: &str) -> Result<String, AiError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::MalformedResponse("no choices in response".to_string()))?
        .message
        .content
        .ok_or_else(|| AiError::MalformedResponse("choice has no content".to_string()))
}

#[async_trait]
impl Augmentor for RemoteAugmentor {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn augment(
        &self,
        source: &str,
        language: Language,
    ) -> Result<AugmentedResult, AiError> {
        let content = self.complete(source, language).await?;
        tracing::debug!(chars = content.len(), "received completion");
        Ok(prompt::parse_assessment(&content))
    }
}
