// Shared prompt fragments for email-producing prompts.
// Each generation prompt lives in generation/prompts.rs; this file holds the
// cross-cutting output rules every email prompt must carry.

/// Closing rule. The signature block is appended downstream.
pub const CLOSING_INSTRUCTION: &str = "ALWAYS end the email body with \"Best Regards,\" before the signature \
    (the signature will be added automatically by the system)";

/// Forbids the signature placeholders the sanitizer would otherwise have to strip.
pub const NO_PLACEHOLDERS_INSTRUCTION: &str = "IMPORTANT: Do NOT include any placeholder fields or bracketed \
    placeholders like [Your Name], [Your Job Title], [Your Company], or [Your Contact Information] in the \
    email content. The signature will be added automatically by the system.";

/// The subject line is synthesized by the caller.
pub const NO_SUBJECT_INSTRUCTION: &str = "CRITICAL: Do NOT include a subject line in the email content. \
    Do NOT write \"Subject:\" anywhere in the email body. Only write the email body content starting \
    with the greeting.";

/// Prefix prepended to the last message when the fallback model's first email was rejected.
pub const REWRITE_FROM_START_INSTRUCTION: &str = "The previous email was cut off. Rewrite the entire \
    rejection email from the beginning, ensuring a complete email with greeting, 3–4 full paragraphs, \
    bolded improvement headings, and a closing with \"Best Regards,\".";
