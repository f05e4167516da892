//! OpenAI Chat Completions adapter.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_http_client, execute, non_empty_text, parse_body, GenerationParams, LlmProvider,
    Prompt, ProviderError, ProviderKind,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o"];

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl OpenAiProvider {
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
impl LlmProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);

        let raw = execute(provider, model, request).await?;
        let response: ChatResponse = parse_body(provider, &raw)?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        non_empty_text(provider, text)
    }
}
