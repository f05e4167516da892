//! Google Gemini `generateContent` adapter.
//!
//! Gemini is first in the auto precedence and carries the longest model list:
//! a retired or overloaded model falls through to the next identifier.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_http_client, execute, non_empty_text, parse_body, GenerationParams, LlmProvider,
    Prompt, ProviderError, ProviderKind,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        Some(content.parts.into_iter().filter_map(|p| p.text).collect())
    }
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GeminiProvider {
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
impl LlmProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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

        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &prompt.system,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let request = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", api_key)
            .json(&body);

        let raw = execute(provider, model, request).await?;
        let response: GeminiResponse = parse_body(provider, &raw)?;
        non_empty_text(provider, response.text())
    }
}
