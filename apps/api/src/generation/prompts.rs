// Prompt builders for the generation module.
// Reuses cross-cutting output rules from llm_client::prompts.

use crate::generation::seniority::SeniorityTier;
use crate::llm_client::prompts::{
    CLOSING_INSTRUCTION, NO_PLACEHOLDERS_INSTRUCTION, NO_SUBJECT_INSTRUCTION,
    REWRITE_FROM_START_INSTRUCTION,
};
use crate::llm_client::ChatMessage;
use crate::models::email::{GenerationRequest, RedraftRequest};

/// Per-tier improvement focus, listed so the model sees the whole ladder.
const TIER_LADDER: &str = "\
  * Junior/Entry-level: Focus on gaining experience, building projects, taking courses, developing core skills, internships, volunteer work, or freelance projects
  * Mid-level: Focus on building expertise, taking on more responsibility, professional development, certifications, and advancing to senior roles
  * Senior: Focus on leadership, strategic thinking, mentoring others, advanced certifications, industry thought leadership, and complex problem-solving
  * Management/Executive: Focus on team management, strategic planning, organizational leadership, executive education, and driving business outcomes";

fn context_lines(request: &GenerationRequest, tier: SeniorityTier, long_labels: bool) -> String {
    let (name_label, notes_label, rating_label) = if long_labels {
        ("Name", "Interview Notes", "Interview Rating")
    } else {
        ("Candidate", "Notes", "Rating")
    };

    let mut lines = format!(
        "- {name_label}: {}\n- Position: {}\n- Seniority Level: {}\n- {rating_label}: {}/10\n- {notes_label}: {}\n\
        - Rejection Reasons: {}\n- Areas for Improvement: {}",
        request.candidate_name,
        request.position,
        tier.label(),
        request.rating,
        request.notes,
        request.rejection_reasons.join(", "),
        request.areas_for_improvement.join(", "),
    );
    if let Some(company) = request.company() {
        lines.push_str(&format!("\n- Company Name: {company}"));
    }
    lines
}

fn hands_on_ladder() -> String {
    [
        SeniorityTier::Junior,
        SeniorityTier::Mid,
        SeniorityTier::Senior,
        SeniorityTier::Executive,
    ]
    .iter()
    .map(|tier| format!("  * {}: {}", ladder_name(*tier), tier.hands_on_advice()))
    .collect::<Vec<_>>()
    .join("\n")
}

fn ladder_name(tier: SeniorityTier) -> &'static str {
    match tier {
        SeniorityTier::Junior => "Junior",
        SeniorityTier::Mid => "Mid-level",
        SeniorityTier::Senior => "Senior",
        SeniorityTier::Executive => "Management/Executive",
    }
}

/// First-draft prompt.
pub fn build_generation_prompt(request: &GenerationRequest, tier: SeniorityTier) -> String {
    let name = &request.candidate_name;
    let level = tier.label();
    let thanks = match request.company() {
        Some(company) => format!(
            "After the salutation, include: \"Thank you for taking the time to interview for the {} position with us at {company}.\"",
            request.position
        ),
        None => "After the salutation, thank them for their time and interest".to_string(),
    };

    format!(
        "Generate a professional, empathetic rejection email for a job candidate.

Candidate Details:
{context}

Seniority Context:
{guidance}

Requirements:
- Be empathetic and professional
- ALWAYS start the email with the salutation: \"Dear {name},\"
- {thanks}
- Provide constructive feedback with specific, actionable guidance tailored to the {level} level
- Include a dedicated section explaining HOW the candidate can work towards improving their identified areas for improvement
- For each area of improvement mentioned, provide 2-3 concrete, actionable steps or suggestions appropriate for {level} professionals
- Tailor improvement suggestions based on seniority level:
{ladder}
- For \"Hands-On Experience\" specifically, tailor suggestions to the seniority level:
{hands_on}
- Keep it concise but comprehensive (3-4 paragraphs)
- End with encouragement for future opportunities
- {closing}
- Use a warm but professional tone
- Make the improvement suggestions feel genuine and helpful, not generic
- {placeholders}
- {subject}

Generate the email content (body only, no subject line):",
        context = context_lines(request, tier, true),
        guidance = tier.guidance(),
        ladder = TIER_LADDER,
        hands_on = hands_on_ladder(),
        closing = CLOSING_INSTRUCTION,
        placeholders = NO_PLACEHOLDERS_INSTRUCTION,
        subject = NO_SUBJECT_INSTRUCTION,
    )
}

/// Instruction-guided rewrite prompt.
pub fn build_redraft_prompt(redraft: &RedraftRequest, tier: SeniorityTier) -> String {
    let request = &redraft.request;
    let name = &request.candidate_name;
    let level = tier.label();
    let company_line = match request.company() {
        Some(company) => format!(
            "\n- If the opening line doesn't already mention the company, ensure it includes: \"Thank you for taking the time to interview for the {} position with us at {company}.\"",
            request.position
        ),
        None => String::new(),
    };

    format!(
        "Redraft this rejection email based on the feedback provided.

Original Email:
{original}

Redraft Instructions:
{instructions}

Original Context:
{context}

Requirements:
- Tailor improvement suggestions to the {level} level
- ALWAYS start the email with the salutation: \"Dear {name},\"{company_line}
- {closing}
- {placeholders}
- {subject}

Generate the redrafted email (body only, no subject line):",
        original = redraft.original_content,
        instructions = redraft.instructions,
        context = context_lines(request, tier, false),
        closing = CLOSING_INSTRUCTION,
        placeholders = NO_PLACEHOLDERS_INSTRUCTION,
        subject = NO_SUBJECT_INSTRUCTION,
    )
}

/// Copy of `messages` whose last message is prefixed with the rewrite instruction.
pub fn rewrite_from_start(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut retry = messages.to_vec();
    if let Some(last) = retry.last_mut() {
        last.content = format!("{REWRITE_FROM_START_INSTRUCTION}\n\n{}", last.content);
    }
    retry
}
