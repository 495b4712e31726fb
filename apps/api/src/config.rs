use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

pub const DEFAULT_SENIOR_MODEL: &str = "anthropic/claude-opus-4.5";
pub const DEFAULT_STANDARD_MODEL: &str = "anthropic/claude-sonnet-4.5";
pub const DEFAULT_FALLBACK_MODEL: &str = "openai/gpt-4-turbo";

/// Model identifiers and sampling bounds handed to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub senior: String,
    pub standard: String,
    pub fallback: String,
    pub primary_max_tokens: u32,
    /// Hard upper bound for fallback model completions.
    pub fallback_max_tokens: u32,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            senior: DEFAULT_SENIOR_MODEL.to_string(),
            standard: DEFAULT_STANDARD_MODEL.to_string(),
            fallback: DEFAULT_FALLBACK_MODEL.to_string(),
            primary_max_tokens: 800,
            fallback_max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub models: ModelConfig,
    pub balance_check: bool,
    pub generation_timeout: Duration,
    pub bulk_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            senior: env_or("MODEL_SENIOR", &defaults.senior),
            standard: env_or("MODEL_STANDARD", &defaults.standard),
            fallback: env_or("MODEL_FALLBACK", &defaults.fallback),
            fallback_max_tokens: parse_env("FALLBACK_MAX_TOKENS", defaults.fallback_max_tokens)?,
            ..defaults
        };

        Ok(Config {
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            openrouter_base_url: env_or("OPENROUTER_BASE_URL", DEFAULT_BASE_URL),
            models,
            balance_check: !matches!(
                env_or("BALANCE_CHECK", "on").to_ascii_lowercase().as_str(),
                "off" | "false" | "0"
            ),
            generation_timeout: Duration::from_secs(parse_env("GENERATION_TIMEOUT_SECS", 90)?),
            bulk_concurrency: parse_env::<usize>("BULK_CONCURRENCY", 4)?.max(1),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number, got '{raw}'")),
        _ => Ok(default),
    }
}
