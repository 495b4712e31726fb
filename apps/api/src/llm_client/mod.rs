/// LLM Client — the single point of entry for all completion API calls.
///
/// ARCHITECTURAL RULE: No other module may call the upstream provider directly.
/// Completions go through `CompletionApi`, credit lookups through `fetch_credits`.
///
/// The wire format is the OpenAI-compatible chat-completion API exposed by OpenRouter.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const REFERER: &str = "https://rejectflow.vercel.app";
const APP_TITLE: &str = "RejectFlow - Recruitment Assistant";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Upstream API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Completion response contained no choices")]
    EmptyChoice,
}

impl CompletionError {
    /// HTTP 402 or a credit-related message. Used for logging only.
    pub fn is_credit_error(&self) -> bool {
        let message = match self {
            CompletionError::Api { status: 402, .. } => return true,
            CompletionError::Api { message, .. } => message.to_lowercase(),
            CompletionError::Http(e) => {
                if e.status().map(|s| s.as_u16()) == Some(402) {
                    return true;
                }
                e.to_string().to_lowercase()
            }
            _ => return false,
        };
        message.contains("insufficient credits") || message.contains("payment required")
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Api { status, .. } => Some(*status),
            CompletionError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One single-turn completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    data: Option<CreditsData>,
}

/// Credit totals reported by the provider's credits endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CreditsData {
    #[serde(default)]
    pub total_credits: f64,
    #[serde(default)]
    pub total_usage: f64,
}

impl CreditsData {
    pub fn remaining(&self) -> f64 {
        self.total_credits - self.total_usage
    }
}

/// The upstream completion seam. `LlmClient` is the production implementation;
/// tests script their own.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Returns the text of the first choice. An absent message content is
    /// returned as an empty string so validators can judge it.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Thin OpenRouter client. Unlike the generation pipeline it never retries:
/// retry policy belongs to the orchestrator.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    /// Fails with `MissingApiKey` before any network activity when the key is blank.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, CompletionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}/credits`.
    pub async fn fetch_credits(&self) -> Result<CreditsData, CompletionError> {
        let response = self
            .client
            .get(format!("{}/credits", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: CreditsResponse = serde_json::from_str(&body)?;
        Ok(parsed.data.unwrap_or_default())
    }
}

#[async_trait]
impl CompletionApi for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Completion succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                request.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyChoice)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
