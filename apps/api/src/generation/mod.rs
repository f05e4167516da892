// Content generation: prompt building, response extraction, compatibility
// scoring, template fallback, and the orchestrators that drive them.
// All provider calls go through llm_client::ProviderRouter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::{ProviderError, ProviderKind, ProviderResult, RouterError};

pub mod angles;
pub mod compatibility;
pub mod extractor;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod proposals;
pub mod templates;

use extractor::ExtractError;

/// Where a piece of generated text came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenerationSource {
    Ai { provider: ProviderKind, model: String },
    Template,
}

impl GenerationSource {
    pub fn from_result(result: &ProviderResult) -> Self {
        GenerationSource::Ai {
            provider: result.provider,
            model: result.model.clone(),
        }
    }
}

/// Task kinds a `GenerationRequest` can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Title,
    Introduction,
    Section,
    AngleProposal,
}

/// The one descriptive error a caller sees. Only the title task and
/// misconfigured requests can produce it; every other task falls back to
/// templates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error(
        "No AI provider is configured. Set GEMINI_API_KEY, OPENAI_API_KEY or \
         ANTHROPIC_API_KEY to generate title proposals."
    )]
    NoProviderConfigured,

    #[error("The {} provider is not configured. Set {} or choose another provider.", .0, .0.credential_var())]
    MissingCredential(ProviderKind),

    #[error("The AI provider call failed ({0}). Check the provider's status and credentials, then try again.")]
    ProviderFailed(RouterError),

    #[error("The AI response could not be used: {0}")]
    MalformedOutput(#[from] ExtractError),

    #[error("No usable output was produced")]
    NoUsableOutput,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<RouterError> for GenerationError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::NoProviderConfigured => GenerationError::NoProviderConfigured,
            RouterError::Provider(ProviderError::MissingCredential { provider }) => {
                GenerationError::MissingCredential(provider)
            }
            other => GenerationError::ProviderFailed(other),
        }
    }
}
