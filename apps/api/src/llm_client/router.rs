//! Provider Router: ordered fallback across interchangeable providers.
//!
//! "auto" walks the configured providers in `ProviderKind::PRIORITY` order and
//! returns the first success; an explicit preference tries that provider only.
//! Adding a provider means adding an `LlmProvider` impl to the list, nothing else.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::{GenerationParams, LlmProvider, Prompt, ProviderError, ProviderKind, ProviderResult};

/// Which provider the caller wants. Serialized as `"auto"` or a provider name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreference {
    #[default]
    Auto,
    Gemini,
    OpenAi,
    Anthropic,
}

impl ProviderPreference {
    pub fn explicit(&self) -> Option<ProviderKind> {
        match self {
            ProviderPreference::Auto => None,
            ProviderPreference::Gemini => Some(ProviderKind::Gemini),
            ProviderPreference::OpenAi => Some(ProviderKind::OpenAi),
            ProviderPreference::Anthropic => Some(ProviderKind::Anthropic),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouterError {
    #[error("no language-model provider is configured")]
    NoProviderConfigured,

    #[error(transparent)]
    Provider(ProviderError),

    #[error("all {attempts} configured providers failed; last error: {last}")]
    Exhausted { attempts: usize, last: ProviderError },
}

impl RouterError {
    /// True when the failure comes from absent credentials rather than a failed call.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(
            self,
            RouterError::NoProviderConfigured
                | RouterError::Provider(ProviderError::MissingCredential { .. })
        )
    }
}

/// Snapshot of one provider's availability, for diagnostics endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub configured: bool,
    pub models: Vec<String>,
}

#[derive(Clone)]
pub struct ProviderRouter {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderRouter {
    /// `providers` must already be in priority order.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Builds the Gemini → OpenAI → Anthropic chain from configured credentials.
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.provider_timeout_secs);
        let providers: Vec<Arc<dyn LlmProvider>> = ProviderKind::PRIORITY
            .iter()
            .map(|kind| -> Arc<dyn LlmProvider> {
                match kind {
                    ProviderKind::Gemini => {
                        let provider = GeminiProvider::new(config.gemini_api_key.clone(), timeout);
                        Arc::new(match &config.gemini_models {
                            Some(models) => provider.with_models(models.clone()),
                            None => provider,
                        })
                    }
                    ProviderKind::OpenAi => {
                        let provider = OpenAiProvider::new(config.openai_api_key.clone(), timeout);
                        Arc::new(match &config.openai_models {
                            Some(models) => provider.with_models(models.clone()),
                            None => provider,
                        })
                    }
                    ProviderKind::Anthropic => {
                        let provider =
                            AnthropicProvider::new(config.anthropic_api_key.clone(), timeout);
                        Arc::new(match &config.anthropic_models {
                            Some(models) => provider.with_models(models.clone()),
                            None => provider,
                        })
                    }
                }
            })
            .collect();
        Self::new(providers)
    }

    pub fn has_configured_provider(&self) -> bool {
        self.providers.iter().any(|p| p.is_configured())
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                provider: p.kind(),
                configured: p.is_configured(),
                models: p.models().to_vec(),
            })
            .collect()
    }

    pub async fn generate(
        &self,
        prompt: &Prompt,
        params: &GenerationParams,
        preference: ProviderPreference,
    ) -> Result<ProviderResult, RouterError> {
        match preference.explicit() {
            Some(kind) => self.generate_explicit(kind, prompt, params).await,
            None => self.generate_auto(prompt, params).await,
        }
    }

    async fn generate_explicit(
        &self,
        kind: ProviderKind,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<ProviderResult, RouterError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.kind() == kind && p.is_configured())
            .ok_or(RouterError::Provider(ProviderError::MissingCredential {
                provider: kind,
            }))?;

        provider
            .call(prompt, params)
            .await
            .map_err(RouterError::Provider)
    }

    async fn generate_auto(
        &self,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<ProviderResult, RouterError> {
        let mut attempts = 0;
        let mut last_error = None;

        for provider in self.providers.iter().filter(|p| p.is_configured()) {
            attempts += 1;
            match provider.call(prompt, params).await {
                Ok(result) => {
                    info!(
                        "Generated with {} ({}) after {} attempt(s)",
                        result.provider, result.model, attempts
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!("Provider {} failed, falling back: {e}", e.provider());
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(RouterError::Exhausted { attempts, last }),
            None => Err(RouterError::NoProviderConfigured),
        }
    }
}
