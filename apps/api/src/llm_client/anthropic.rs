//! Anthropic Messages API adapter.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    build_http_client, execute, non_empty_text, parse_body, GenerationParams, LlmProvider,
    Prompt, ProviderError, ProviderKind,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODELS: &[&str] = &["claude-sonnet-4-5", "claude-3-5-haiku-latest"];

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Concatenated text of all text blocks.
    fn text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect();
        Some(text)
    }
}

#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
}

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_http_client(timeout),
            api_key: super::credential(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn call_model(
        &self,
        model: &str,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let provider = self.kind();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential { provider })?;

        let body = AnthropicRequest {
            model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: &prompt.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &prompt.user,
            }],
        };

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let raw = execute(provider, model, request).await?;
        let response: AnthropicResponse = parse_body(provider, &raw)?;
        if let Some(usage) = &response.usage {
            debug!(
                "anthropic usage: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }
        non_empty_text(provider, response.text())
    }
}
