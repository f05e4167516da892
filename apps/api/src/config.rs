use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional: a missing key only removes that provider
/// from the fallback chain.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Ordered model-list overrides, comma separated in the environment.
    pub gemini_models: Option<Vec<String>>,
    pub openai_models: Option<Vec<String>>,
    pub anthropic_models: Option<Vec<String>>,
    /// Provider-level HTTP timeout for generation calls.
    pub provider_timeout_secs: u64,
    pub trends_api_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            gemini_models: list_env("GEMINI_MODELS"),
            openai_models: list_env("OPENAI_MODELS"),
            anthropic_models: list_env("ANTHROPIC_MODELS"),
            provider_timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            trends_api_url: optional_env("TRENDS_API_URL"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank values are treated the same as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn list_env(key: &str) -> Option<Vec<String>> {
    optional_env(key).and_then(|v| parse_list(&v))
}

fn parse_list(value: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
