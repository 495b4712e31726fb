// Rejection email generation core.
// Implements: model tiering, balance-aware routing, fallback retry, validation gates.
// All completion calls go through llm_client — no direct provider calls here.

pub mod balance;
pub mod bulk;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod seniority;
pub mod validation;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::generation::seniority::ModelTier;
use crate::llm_client::CompletionError;

/// Typed failure of one orchestration call. Never carries partial content.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream completion failed: {0}")]
    Upstream(#[source] CompletionError),

    #[error("EmptyOrShortContent: model={model}, length={length}, min={min}")]
    EmptyOrShortContent {
        model: String,
        length: usize,
        min: usize,
    },

    #[error("IncompleteEmailError: model={model}, length={length}")]
    IncompleteEmail { model: String, length: usize },

    #[error("Generation did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<CompletionError> for GenerationError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::MissingApiKey => GenerationError::Configuration(err.to_string()),
            other => GenerationError::Upstream(other),
        }
    }
}

impl GenerationError {
    /// Configuration problems are raised as-is; no fallback, no retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerationError::Configuration(_))
    }

    pub fn is_credit_error(&self) -> bool {
        matches!(self, GenerationError::Upstream(e) if e.is_credit_error())
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, GenerationError::IncompleteEmail { .. })
    }
}

/// Which single model call produced the accepted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPath {
    Primary,
    Fallback,
    FallbackRetry,
}

/// A validated, sanitized email body.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedEmail {
    /// Plain text: subject lines and placeholders stripped, blank lines normalized.
    pub content: String,
    /// Block markup ready for the downstream envelope.
    pub html: String,
    pub model: String,
    pub tier: ModelTier,
    pub path: GenerationPath,
}

pub type GenerationOutcome = Result<GeneratedEmail, GenerationError>;
