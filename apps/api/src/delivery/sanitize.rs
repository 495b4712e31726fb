//! Email content sanitizer — the last pass before content is deliverable.
//!
//! Order matters and is fixed:
//! 1. `**X**` → `<strong>X</strong>`
//! 2. strip `Subject:` lines and inline `Subject: ...` runs
//! 3. strip the four signature placeholders
//! 4. collapse 3+ line breaks to 2
//! 5. exactly one line break after a closing phrase
//! 6. paragraphs / `<br>` / single `<p>` wrapper
//!
//! Pure and deterministic. Running it on its own output is a no-op.

use std::sync::LazyLock;

use regex::Regex;

const PLACEHOLDERS: &[&str] = &[
    "[Your Name]",
    "[Your Job Title]",
    "[Your Company]",
    "[Your Contact Information]",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer pattern is valid")
}

static MARKDOWN_BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*([^*]+)\*\*"));
// `[ \t]` rather than `\s`: a bare `Subject:` line must not swallow the next line.
static SUBJECT_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?im)^Subject[ \t]*:[ \t]*.*$"));
static SUBJECT_INLINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)Subject[ \t]*:[ \t]*[^\n]+"));
static EXCESS_BREAKS: LazyLock<Regex> = LazyLock::new(|| compile(r"\n{3,}"));
static AFTER_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(Best regards,?|Warm regards,?|Sincerely,?)\s*\n{2,}"));
static BEFORE_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\n{3,}(Best regards|Warm regards|Sincerely)"));
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\n+"));
static BETWEEN_BLOCKS: LazyLock<Regex> = LazyLock::new(|| compile(r"</p>\s+<p>"));

static PLACEHOLDER_PATTERNS: LazyLock<Vec<(Regex, Regex)>> = LazyLock::new(|| {
    PLACEHOLDERS
        .iter()
        .map(|placeholder| {
            let escaped = regex::escape(placeholder);
            (compile(&format!(r"(?m)^\s*{escaped}\s*$")), compile(&escaped))
        })
        .collect()
});

/// Full sanitization to block markup.
pub fn sanitize(text: &str) -> String {
    let cleaned = clean_text(&markdown_bold(text));
    to_blocks(&cleaned)
}

/// Steps 2–5 only, trimmed. Plain text with no subject line or placeholders.
pub fn sanitize_text(text: &str) -> String {
    clean_text(text)
}

/// Repeats until no `**X**` span is left: "****X**y**" needs two rounds.
fn markdown_bold(text: &str) -> String {
    let mut out = text.to_string();
    while MARKDOWN_BOLD.is_match(&out) {
        out = MARKDOWN_BOLD
            .replace_all(&out, "<strong>$1</strong>")
            .into_owned();
    }
    out
}

fn clean_text(text: &str) -> String {
    let mut processed = SUBJECT_LINE.replace_all(text, "").into_owned();
    processed = SUBJECT_INLINE.replace_all(&processed, "").into_owned();
    processed = EXCESS_BREAKS.replace_all(&processed, "\n\n").into_owned();

    for (own_line, inline) in PLACEHOLDER_PATTERNS.iter() {
        processed = own_line.replace_all(&processed, "").into_owned();
        processed = inline.replace_all(&processed, "").into_owned();
    }

    processed = EXCESS_BREAKS.replace_all(&processed, "\n\n").into_owned();
    processed = AFTER_CLOSING.replace_all(&processed, "${1}\n").into_owned();
    processed = BEFORE_CLOSING.replace_all(&processed, "\n${1}").into_owned();

    processed.trim().to_string()
}

fn to_blocks(text: &str) -> String {
    let text = BETWEEN_BLOCKS.replace_all(text, "</p><p>");
    let paragraphs = PARAGRAPH_BREAK.replace_all(&text, "</p><p>");
    let lines = paragraphs.replace('\n', "<br>");
    // Already block markup, e.g. a second pass or an HTML redraft: no extra wrapper.
    if text.starts_with("<p>") && text.ends_with("</p>") {
        lines
    } else {
        format!("<p>{lines}</p>")
    }
}
