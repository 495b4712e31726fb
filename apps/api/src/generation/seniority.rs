//! Seniority classification — two independent classifiers over the same title.
//!
//! `KeywordModelSelector` makes the binary model-tier decision (senior vs standard).
//! `SeniorityTier` buckets the title into four narrative tiers that only steer
//! prompt wording. The two keyword lists differ on purpose and are not kept
//! consistent with each other: "chief" selects the senior model but narrates as mid-level.

use serde::Serialize;

use crate::config::ModelConfig;

/// Substring signals for the senior model. Substring, not whole-word: "leader" matches "lead".
const SENIOR_MODEL_KEYWORDS: &[&str] = &[
    "senior",
    "lead",
    "principal",
    "staff",
    "manager",
    "director",
    "head",
    "vp",
    "vice president",
    "chief",
    "cto",
    "cfo",
    "ceo",
    "coo",
    "cio",
];

const JUNIOR_SIGNALS: &[&str] = &["junior", "entry", "intern"];
const SENIOR_SIGNALS: &[&str] = &["senior", "lead", "principal", "staff"];
const EXECUTIVE_SIGNALS: &[&str] = &["manager", "director", "head", "vp", "vice president"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Senior,
    Standard,
}

impl ModelTier {
    /// Label used in usage logs.
    pub fn log_label(self) -> &'static str {
        match self {
            ModelTier::Senior => "senior+",
            ModelTier::Standard => "standard",
        }
    }
}

/// The primary model picked for one request, plus the fixed fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub tier: ModelTier,
    pub fallback: String,
}

/// Maps a job title to a primary model. Swap implementations without touching
/// the orchestrator.
pub trait ModelSelector: Send + Sync {
    fn select_model(&self, position: &str) -> ModelChoice;
}

/// Default selector: fixed keyword list, substring match on the lower-cased title.
pub struct KeywordModelSelector {
    senior: String,
    standard: String,
    fallback: String,
}

impl KeywordModelSelector {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            senior: config.senior.clone(),
            standard: config.standard.clone(),
            fallback: config.fallback.clone(),
        }
    }
}

impl ModelSelector for KeywordModelSelector {
    fn select_model(&self, position: &str) -> ModelChoice {
        let tier = if contains_any(&position.to_lowercase(), SENIOR_MODEL_KEYWORDS) {
            ModelTier::Senior
        } else {
            ModelTier::Standard
        };

        let model = match tier {
            ModelTier::Senior => self.senior.clone(),
            ModelTier::Standard => self.standard.clone(),
        };

        ModelChoice {
            model,
            tier,
            fallback: self.fallback.clone(),
        }
    }
}

/// Narrative seniority used only for prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityTier {
    Junior,
    Mid,
    Senior,
    Executive,
}

impl SeniorityTier {
    /// First matching bucket wins: junior, then senior, then executive, else mid.
    pub fn from_position(position: &str) -> Self {
        let lower = position.to_lowercase();
        if contains_any(&lower, JUNIOR_SIGNALS) {
            SeniorityTier::Junior
        } else if contains_any(&lower, SENIOR_SIGNALS) {
            SeniorityTier::Senior
        } else if contains_any(&lower, EXECUTIVE_SIGNALS) {
            SeniorityTier::Executive
        } else {
            SeniorityTier::Mid
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeniorityTier::Junior => "junior",
            SeniorityTier::Mid => "mid-level",
            SeniorityTier::Senior => "senior",
            SeniorityTier::Executive => "executive",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            SeniorityTier::Junior => {
                "This is a junior/entry-level position. Focus improvement suggestions on gaining \
                foundational experience, building projects, taking courses, and developing core skills."
            }
            SeniorityTier::Mid => {
                "This is a mid-level position. Focus improvement suggestions on building expertise, \
                taking on more responsibility, professional development, and advancing to senior roles."
            }
            SeniorityTier::Senior => {
                "This is a senior-level position. Focus improvement suggestions on leadership, strategic \
                thinking, mentoring others, advanced certifications, industry thought leadership, and \
                complex problem-solving."
            }
            SeniorityTier::Executive => {
                "This is a management/executive position. Focus improvement suggestions on team \
                management, strategic planning, organizational leadership, industry thought leadership, \
                executive education, and driving business outcomes."
            }
        }
    }

    /// Tier-specific advice for a "Hands-On Experience" improvement area.
    pub fn hands_on_advice(self) -> &'static str {
        match self {
            SeniorityTier::Junior => {
                "Suggest hands-on projects, internships, volunteer work, coding bootcamps, or \
                entry-level freelance opportunities"
            }
            SeniorityTier::Mid => {
                "Suggest leading projects, contributing to open source, taking on stretch assignments, \
                or specialized training"
            }
            SeniorityTier::Senior => {
                "Suggest mentoring programs, technical leadership roles, speaking at conferences, or \
                consulting opportunities"
            }
            SeniorityTier::Executive => {
                "Suggest leading cross-functional teams, strategic initiatives, or executive coaching"
            }
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
