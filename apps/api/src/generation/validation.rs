use std::sync::LazyLock;

use regex::Regex;

use crate::generation::GenerationError;

/// Light bar for primary-model output.
pub const PRIMARY_MIN_LENGTH: usize = 100;
/// Default bar for generic content.
#[cfg(test)]
pub const DEFAULT_MIN_LENGTH: usize = 20;
/// Minimum length before the strict structural check is even attempted.
pub const STRICT_MIN_LENGTH: usize = 200;
/// Below this a fallback email is considered truncated regardless of structure.
pub const COMPLETE_EMAIL_MIN_LENGTH: usize = 800;

const HEADING_LABELS: &[&str] = &["Leadership Abilities", "Strategic Thinking", "Team Collaboration"];

static BOLD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*\n]+:\*\*").expect("bold heading pattern is valid"));

static PLAIN_HEADINGS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    HEADING_LABELS
        .iter()
        .map(|label| {
            let pattern = format!(r"(?m)^{}:", regex::escape(label));
            let regex = Regex::new(&pattern).expect("heading pattern is valid");
            (regex, format!("**{label}:**"))
        })
        .collect()
});

/// Trimmed text, or `EmptyOrShortContent` if it is shorter than `min_len` chars.
pub fn ensure_non_empty(text: &str, min_len: usize, model: &str) -> Result<String, GenerationError> {
    let normalized = text.trim();
    let length = normalized.chars().count();
    if length == 0 || length < min_len {
        return Err(GenerationError::EmptyOrShortContent {
            model: model.to_string(),
            length,
            min: min_len,
        });
    }
    Ok(normalized.to_string())
}

/// Structural completeness check for a full email.
///
/// False below `COMPLETE_EMAIL_MIN_LENGTH`; otherwise requires all of:
/// - a `"Dear "` greeting at the very start
/// - a `"Best Regards,"` / `"Best regards,"` closing
/// - at least one `**Heading:**` span
pub fn is_complete_email(text: &str) -> bool {
    let normalized = text.trim();
    if normalized.chars().count() < COMPLETE_EMAIL_MIN_LENGTH {
        return false;
    }

    let has_greeting = normalized.starts_with("Dear ");
    let has_closing = normalized.contains("Best Regards,") || normalized.contains("Best regards,");
    let has_bold_heading = BOLD_HEADING.is_match(normalized);

    has_greeting && has_closing && has_bold_heading
}

/// Strict gate used on fallback output. Every failure, short or structural,
/// is reported as `IncompleteEmail` so the caller sees one retryable class.
pub fn ensure_complete_email(text: &str, model: &str) -> Result<String, GenerationError> {
    let normalized = ensure_non_empty(text, STRICT_MIN_LENGTH, model).map_err(|err| match err {
        GenerationError::EmptyOrShortContent { model, length, .. } => {
            GenerationError::IncompleteEmail { model, length }
        }
        other => other,
    })?;

    if !is_complete_email(&normalized) {
        return Err(GenerationError::IncompleteEmail {
            model: model.to_string(),
            length: normalized.chars().count(),
        });
    }
    Ok(normalized)
}

/// Bold-wraps the fixed improvement headings when they appear bare at line start.
/// Cosmetic only; never fails.
pub fn enforce_bold_headings(text: &str) -> String {
    let mut result = text.to_string();
    for (regex, bold) in PLAIN_HEADINGS.iter() {
        result = regex.replace_all(&result, bold.as_str()).into_owned();
    }
    result
}

#[cfg(test)]
pub(crate) fn complete_email_fixture(name: &str, company: &str) -> String {
    let paragraph = "We truly appreciated the time you invested and the thoughtful answers you gave \
        throughout each stage of the process, and we want to share feedback that can help you grow. ";
    format!(
        "Dear {name},\n\nThank you for taking the time to interview with us at {company}. {p}{p}\n\n\
        **System design:** Practice decomposing large services into components. {p}\n\n\
        **Leadership Abilities:** Mentor a junior colleague and lead a design review. {p}\n\n\
        We encourage you to apply again in the future. {p}\n\nBest Regards,",
        p = paragraph
    )
}
