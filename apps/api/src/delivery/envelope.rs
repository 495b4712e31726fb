//! Subject line and signature assembly around a sanitized body.
//!
//! The generation core never emits either; both are synthesized here from the
//! sender's profile so nothing collides with model output.

use serde::{Deserialize, Serialize};

const DEFAULT_DISPLAY_NAME: &str = "Recruitment Team";

pub fn subject_for(position: &str) -> String {
    format!("Update on your application for {}", position.trim())
}

/// Sender details appended below the body. Blank fields are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Signature {
    /// Sender, then company, then a generic team name.
    pub fn display_name(&self) -> &str {
        present(&self.sender_name)
            .or_else(|| present(&self.company_name))
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn is_empty(&self) -> bool {
        [&self.sender_name, &self.job_title, &self.company_name, &self.contact_info]
            .iter()
            .all(|f| present(f).is_none())
    }

    pub fn to_html(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut html = String::from("<div class=\"signature\">");
        if let Some(name) = present(&self.sender_name) {
            html.push_str(&format!("<div class=\"signature-name\">{}</div>", escape_html(name)));
        }
        for field in [&self.job_title, &self.company_name, &self.contact_info] {
            if let Some(value) = present(field) {
                html.push_str(&format!("<div>{}</div>", escape_html(value)));
            }
        }
        html.push_str("</div>");
        html
    }
}

/// A ready-to-send message: subject, sanitized body, signature block.
#[derive(Debug, Clone, Serialize)]
pub struct EmailEnvelope {
    pub subject: String,
    pub from_name: String,
    pub html: String,
}

impl EmailEnvelope {
    pub fn assemble(position: &str, body_html: &str, signature: &Signature) -> Self {
        Self {
            subject: subject_for(position),
            from_name: signature.display_name().to_string(),
            html: format!(
                "<div class=\"content\">{body_html}</div>{}",
                signature.to_html()
            ),
        }
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
