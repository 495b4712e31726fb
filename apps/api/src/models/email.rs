use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A single rejection email to produce. Built by the caller after authorization
/// and quota checks; consumed once by the orchestrator and never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub candidate_name: String,
    pub position: String,
    /// Interview rating, 1 – 10.
    pub rating: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl GenerationRequest {
    /// Company name with blank values treated as absent.
    pub fn company(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.candidate_name.trim().is_empty() {
            return Err(AppError::Validation(
                "candidate_name cannot be empty".to_string(),
            ));
        }
        if self.position.trim().is_empty() {
            return Err(AppError::Validation("position cannot be empty".to_string()));
        }
        if !(1..=10).contains(&self.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 1 and 10, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

/// Instruction-guided rewrite of an existing draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedraftRequest {
    #[serde(flatten)]
    pub request: GenerationRequest,
    pub original_content: String,
    pub instructions: String,
}

impl RedraftRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        self.request.validate()?;
        if self.original_content.trim().is_empty() || self.instructions.trim().is_empty() {
            return Err(AppError::Validation(
                "original_content and instructions are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_request() -> GenerationRequest {
    GenerationRequest {
        candidate_name: "Jane Doe".to_string(),
        position: "Senior Backend Engineer".to_string(),
        rating: 6,
        notes: "Strong coder, weak on system design".to_string(),
        rejection_reasons: vec!["Experience level".to_string()],
        areas_for_improvement: vec!["System design".to_string(), "Leadership Abilities".to_string()],
        company_name: Some("Acme".to_string()),
    }
}
