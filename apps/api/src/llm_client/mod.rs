//! LLM Client: the single point of entry for all language-model calls in Pressroom.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Each adapter owns its provider's request/response shape; `ProviderRouter`
//! owns precedence between providers.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod router;

pub use router::{ProviderPreference, ProviderRouter, ProviderStatus, RouterError};

/// Identity of a language-model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// Fixed "auto" precedence. Provider identity shapes output style, so this
    /// is deliberately not latency-aware.
    pub const PRIORITY: [ProviderKind; 3] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Name of the environment variable holding this provider's credential.
    pub fn credential_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-neutral (system, user) prompt pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Sampling parameters passed through to whichever provider serves the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

/// Text produced by a provider plus the identity that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
}

/// Typed failure of a single provider call.
///
/// Only `ModelUnavailable` lets an adapter advance to its next model; every
/// other kind aborts the adapter immediately.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{provider}: no credential configured ({})", provider.credential_var())]
    MissingCredential { provider: ProviderKind },

    #[error("{provider}: credential rejected: {message}")]
    AuthRejected {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider}: rate limited")]
    RateLimited { provider: ProviderKind },

    #[error("{provider}: model '{model}' unavailable")]
    ModelUnavailable {
        provider: ProviderKind,
        model: String,
    },

    #[error("{provider}: malformed response: {message}")]
    MalformedResponse {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider}: request timed out")]
    Timeout { provider: ProviderKind },

    #[error("{provider}: upstream error (status {status:?}): {message}")]
    Upstream {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderError::MissingCredential { provider }
            | ProviderError::AuthRejected { provider, .. }
            | ProviderError::RateLimited { provider }
            | ProviderError::ModelUnavailable { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::Timeout { provider }
            | ProviderError::Upstream { provider, .. } => *provider,
        }
    }
}

/// Uniform provider capability iterated by `ProviderRouter`.
///
/// Implementors supply one HTTP round-trip per model; the provided `call`
/// walks the ordered model list. No state is retained between calls.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn is_configured(&self) -> bool;

    /// Ordered model identifiers, most preferred first.
    fn models(&self) -> &[String];

    async fn call_model(
        &self,
        model: &str,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    async fn call(
        &self,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<ProviderResult, ProviderError> {
        let provider = self.kind();
        if !self.is_configured() {
            return Err(ProviderError::MissingCredential { provider });
        }

        let mut last_error = None;
        for model in self.models() {
            match self.call_model(model, prompt, params).await {
                Ok(text) => {
                    debug!("{provider} call succeeded with model {model}");
                    return Ok(ProviderResult {
                        text,
                        provider,
                        model: model.clone(),
                    });
                }
                Err(e @ ProviderError::ModelUnavailable { .. }) => {
                    warn!("{e}; trying next model");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(ProviderError::ModelUnavailable {
            provider,
            model: "(none configured)".to_string(),
        }))
    }
}

/// Normalises an optional credential: blank values count as absent.
pub fn credential(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Sends a prepared request and returns the raw success body.
/// Non-success statuses and transport failures are mapped to `ProviderError`.
pub(crate) async fn execute(
    provider: ProviderKind,
    model: &str,
    request: RequestBuilder,
) -> Result<String, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Upstream {
                provider,
                status: None,
                message: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::MalformedResponse {
                provider,
                message: format!("failed to read body: {e}"),
            }
        }
    })?;

    if status.is_success() {
        return Ok(body);
    }

    warn!("{provider} ({model}) returned {status}");
    Err(classify_status(provider, model, status, &body))
}

/// Maps a non-success HTTP status to the provider-neutral failure kind.
pub(crate) fn classify_status(
    provider: ProviderKind,
    model: &str,
    status: StatusCode,
    body: &str,
) -> ProviderError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status.as_u16() {
        401 | 403 => ProviderError::AuthRejected { provider, message },
        429 => ProviderError::RateLimited { provider },
        404 | 503 | 529 => ProviderError::ModelUnavailable {
            provider,
            model: model.to_string(),
        },
        code => ProviderError::Upstream {
            provider,
            status: Some(code),
            message,
        },
    }
}

/// Pulls `error.message` (or a top-level `message`) out of a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok()?;
    parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| parsed.get("message"))
        .and_then(|m| m.as_str())
        .map(ToOwned::to_owned)
}

/// Rejects bodies that parsed but carried no usable text.
pub(crate) fn non_empty_text(
    provider: ProviderKind,
    text: Option<String>,
) -> Result<String, ProviderError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ProviderError::MalformedResponse {
            provider,
            message: "response contained no text".to_string(),
        }),
    }
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    provider: ProviderKind,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
        provider,
        message: e.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::{prompt, ScriptedProvider};
    use super::*;

    #[tokio::test]
    async fn test_model_unavailable_advances_to_next_model() {
        let provider = ScriptedProvider::always(ProviderKind::Gemini, Ok("fine".to_string()))
            .with_models(&["m1", "m2"])
            .then(Err(ProviderError::ModelUnavailable {
                provider: ProviderKind::Gemini,
                model: "m1".to_string(),
            }));

        let result = provider
            .call(&prompt(), &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(result.text, "fine");
        assert_eq!(result.model, "m2");
        assert_eq!(*provider.calls.lock().unwrap(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_other_failure_aborts_model_list() {
        let provider = ScriptedProvider::always(ProviderKind::Gemini, Ok("unused".to_string()))
            .with_models(&["m1", "m2"])
            .then(Err(ProviderError::RateLimited {
                provider: ProviderKind::Gemini,
            }));

        let err = provider
            .call(&prompt(), &GenerationParams::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::RateLimited {
                provider: ProviderKind::Gemini
            }
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_last_model_unavailable_surfaces() {
        let unavailable = |m: &str| {
            Err(ProviderError::ModelUnavailable {
                provider: ProviderKind::OpenAi,
                model: m.to_string(),
            })
        };
        let provider = ScriptedProvider::always(ProviderKind::OpenAi, unavailable("m2"))
            .with_models(&["m1", "m2"])
            .then(unavailable("m1"));

        let err = provider
            .call(&prompt(), &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ModelUnavailable { ref model, .. } if model == "m2"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_reports_missing_credential() {
        let provider = ScriptedProvider::unconfigured(ProviderKind::Anthropic);
        let err = provider
            .call(&prompt(), &GenerationParams::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::MissingCredential {
                provider: ProviderKind::Anthropic
            }
        );
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_classify_status_mapping() {
        let p = ProviderKind::OpenAi;
        assert!(matches!(
            classify_status(p, "m", StatusCode::UNAUTHORIZED, ""),
            ProviderError::AuthRejected { .. }
        ));
        assert!(matches!(
            classify_status(p, "m", StatusCode::FORBIDDEN, ""),
            ProviderError::AuthRejected { .. }
        ));
        assert!(matches!(
            classify_status(p, "m", StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_status(p, "m", StatusCode::NOT_FOUND, ""),
            ProviderError::ModelUnavailable { .. }
        ));
        assert!(matches!(
            classify_status(p, "m", StatusCode::SERVICE_UNAVAILABLE, ""),
            ProviderError::ModelUnavailable { .. }
        ));
        assert!(matches!(
            classify_status(p, "m", StatusCode::INTERNAL_SERVER_ERROR, ""),
            ProviderError::Upstream {
                status: Some(500),
                ..
            }
        ));
    }

    #[test]
    fn test_classify_status_reads_nested_error_message() {
        let err = classify_status(
            ProviderKind::Anthropic,
            "m",
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "invalid x-api-key"}}"#,
        );
        assert_eq!(
            err,
            ProviderError::AuthRejected {
                provider: ProviderKind::Anthropic,
                message: "invalid x-api-key".to_string()
            }
        );
    }

    #[test]
    fn test_blank_credential_counts_as_absent() {
        assert_eq!(credential(Some("   ".to_string())), None);
        assert_eq!(credential(None), None);
        assert_eq!(credential(Some("k".to_string())), Some("k".to_string()));
    }

    #[test]
    fn test_provider_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
        let kind: ProviderKind = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(kind, ProviderKind::Gemini);
    }
}
