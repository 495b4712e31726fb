//! Bulk generation — many independent pipelines, one report.
//!
//! Each candidate is validated and generated in isolation. A failure is recorded
//! against its index and the batch carries on.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::delivery::envelope::subject_for;
use crate::generation::orchestrator::Orchestrator;
use crate::generation::GenerationPath;
use crate::models::email::GenerationRequest;

/// One candidate as submitted by an external HR system. Fields are optional so a
/// malformed item becomes a per-item error instead of rejecting the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkCandidate {
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub position: Option<String>,
    pub rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub rejection_reasons: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub areas_for_improvement: Vec<String>,
}

/// Accepts `"x"`, `["x", "y"]` or `null`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if !s.trim().is_empty() => vec![s],
        Some(OneOrMany::One(_)) | None => Vec::new(),
        Some(OneOrMany::Many(v)) => v,
    })
}

fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl BulkCandidate {
    fn display_name(&self) -> String {
        filled(&self.candidate_name).unwrap_or("Unknown").to_string()
    }

    /// Builds the generation request, or `None` when a required field is missing.
    fn to_request(&self, company_name: Option<&str>) -> Option<GenerationRequest> {
        let name = filled(&self.candidate_name)?;
        filled(&self.candidate_email)?;
        let position = filled(&self.position)?;
        let rating = self.rating.filter(|r| (1..=10).contains(r))?;

        Some(GenerationRequest {
            candidate_name: name.to_string(),
            position: position.to_string(),
            rating,
            notes: self.notes.clone().unwrap_or_default(),
            rejection_reasons: self.rejection_reasons.clone(),
            areas_for_improvement: self.areas_for_improvement.clone(),
            company_name: company_name.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkEmail {
    pub subject: String,
    pub content: String,
    pub html_content: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub position: String,
    pub rating: u8,
    pub model: String,
    pub path: GenerationPath,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub index: usize,
    pub rejection_email: BulkEmail,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkItemError {
    pub index: usize,
    pub error: String,
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub processed: usize,
    pub total: usize,
    pub error_count: usize,
    pub results: Vec<BulkItemResult>,
    pub errors: Vec<BulkItemError>,
}

enum ItemOutcome {
    Generated(BulkItemResult),
    Failed(BulkItemError),
}

async fn generate_one(
    orchestrator: &Orchestrator,
    index: usize,
    candidate: &BulkCandidate,
    company_name: Option<&str>,
) -> ItemOutcome {
    let Some(request) = candidate.to_request(company_name) else {
        return ItemOutcome::Failed(BulkItemError {
            index,
            error: "Missing required fields".to_string(),
            candidate: candidate.display_name(),
            details: None,
        });
    };

    match orchestrator.generate(&request).await {
        Ok(email) => ItemOutcome::Generated(BulkItemResult {
            index,
            rejection_email: BulkEmail {
                subject: subject_for(&request.position),
                content: email.content,
                html_content: email.html,
                candidate_name: request.candidate_name,
                candidate_email: filled(&candidate.candidate_email)
                    .unwrap_or_default()
                    .to_string(),
                position: request.position,
                rating: request.rating,
                model: email.model,
                path: email.path,
                generated_at: Utc::now(),
            },
        }),
        Err(e) => {
            warn!("Bulk item {index} failed: {e}");
            ItemOutcome::Failed(BulkItemError {
                index,
                error: "Processing error".to_string(),
                candidate: request.candidate_name,
                details: Some(e.to_string()),
            })
        }
    }
}

/// Runs up to `concurrency` pipelines at once. Results come back in input order.
pub async fn generate_batch(
    orchestrator: &Orchestrator,
    candidates: &[BulkCandidate],
    company_name: Option<&str>,
    concurrency: usize,
) -> BulkReport {
    let company_name = company_name.map(str::trim).filter(|c| !c.is_empty());

    // Built up front so each future's borrow of `candidates` has one concrete lifetime.
    let pending: Vec<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| Box::pin(generate_one(orchestrator, index, candidate, company_name)))
        .collect();

    let outcomes: Vec<ItemOutcome> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Generated(result) => results.push(result),
            ItemOutcome::Failed(error) => errors.push(error),
        }
    }

    info!(
        "Bulk generation finished: {}/{} generated, {} errors",
        results.len(),
        candidates.len(),
        errors.len()
    );

    BulkReport {
        processed: results.len(),
        total: candidates.len(),
        error_count: errors.len(),
        results,
        errors,
    }
}
