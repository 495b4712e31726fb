//! Axum route handlers for the email generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::delivery::envelope::{EmailEnvelope, Signature};
use crate::errors::AppError;
use crate::generation::bulk::{generate_batch, BulkCandidate, BulkReport};
use crate::generation::seniority::ModelTier;
use crate::generation::{GeneratedEmail, GenerationPath};
use crate::models::email::{GenerationRequest, RedraftRequest};
use crate::state::AppState;

pub const MAX_BULK_CANDIDATES: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateEmailRequest {
    #[serde(flatten)]
    pub request: GenerationRequest,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Debug, Deserialize)]
pub struct RedraftEmailRequest {
    #[serde(flatten)]
    pub redraft: RedraftRequest,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Debug, Deserialize)]
pub struct BulkEmailRequest {
    pub candidates: Vec<BulkCandidate>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub content: String,
    pub html_content: String,
    pub model: String,
    pub tier: ModelTier,
    pub path: GenerationPath,
    /// Present when the caller sent a signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<EmailEnvelope>,
}

impl EmailResponse {
    fn new(email: GeneratedEmail, position: &str, signature: Option<&Signature>) -> Self {
        let envelope = signature.map(|sig| EmailEnvelope::assemble(position, &email.html, sig));
        Self {
            content: email.content,
            html_content: email.html,
            model: email.model,
            tier: email.tier,
            path: email.path,
            envelope,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/emails/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateEmailRequest>,
) -> Result<Json<EmailResponse>, AppError> {
    body.request.validate()?;

    let email = state
        .orchestrator
        .generate_within(&body.request, state.generation_timeout)
        .await?;

    Ok(Json(EmailResponse::new(
        email,
        &body.request.position,
        body.signature.as_ref(),
    )))
}

/// POST /api/v1/emails/redraft
///
/// Rewrites an existing draft following the recruiter's instructions.
pub async fn handle_redraft(
    State(state): State<AppState>,
    Json(body): Json<RedraftEmailRequest>,
) -> Result<Json<EmailResponse>, AppError> {
    body.redraft.validate()?;

    let email = state
        .orchestrator
        .redraft_within(&body.redraft, state.generation_timeout)
        .await?;

    Ok(Json(EmailResponse::new(
        email,
        &body.redraft.request.position,
        body.signature.as_ref(),
    )))
}

/// POST /api/v1/emails/bulk
///
/// Per-candidate failures are reported in the body; the request itself succeeds.
pub async fn handle_bulk(
    State(state): State<AppState>,
    Json(body): Json<BulkEmailRequest>,
) -> Result<Json<BulkReport>, AppError> {
    if body.candidates.is_empty() {
        return Err(AppError::Validation(
            "candidates must be a non-empty array".to_string(),
        ));
    }
    if body.candidates.len() > MAX_BULK_CANDIDATES {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULK_CANDIDATES} candidates per request, got {}",
            body.candidates.len()
        )));
    }

    let report = generate_batch(
        &state.orchestrator,
        &body.candidates,
        body.company_name.as_deref(),
        state.bulk_concurrency,
    )
    .await;

    Ok(Json(report))
}
