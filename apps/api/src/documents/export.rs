//! Export collaborator: turns a finalized snapshot into a downloadable
//! artifact. Rendering is bounded by a fixed 60-second timeout.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::models::document::DocumentSnapshot;

pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_FILENAME: &str = "press-release";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("document rendering exceeded {} seconds", EXPORT_TIMEOUT.as_secs())]
    Timeout,

    #[error("document rendering failed: {0}")]
    Render(String),
}

/// A rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl IntoResponse for Artifact {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, document: &DocumentSnapshot) -> Result<Artifact, ExportError>;
}

/// Renders `document`, giving up after `EXPORT_TIMEOUT`.
pub async fn export_document(
    renderer: &dyn DocumentRenderer,
    document: &DocumentSnapshot,
) -> Result<Artifact, ExportError> {
    match tokio::time::timeout(EXPORT_TIMEOUT, renderer.render(document)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Export of '{}' timed out", document.title);
            Err(ExportError::Timeout)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Markdown renderer
// ────────────────────────────────────────────────────────────────────────────

/// Fixed labels and separators, resolved once per renderer.
#[derive(Debug)]
struct RenderStyle {
    rule: String,
    contact_heading: &'static str,
    company_label: &'static str,
    person_label: &'static str,
    email_label: &'static str,
    phone_label: &'static str,
}

impl RenderStyle {
    fn press_release() -> Self {
        Self {
            rule: "-".repeat(40),
            contact_heading: "【本件に関するお問い合わせ先】",
            company_label: "会社名",
            person_label: "担当者",
            email_label: "E-mail",
            phone_label: "TEL",
        }
    }
}

/// Plain-text press release in Markdown.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    style: OnceCell<RenderStyle>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.style.initialized()
    }

    async fn style(&self) -> &RenderStyle {
        self.style
            .get_or_init(|| async {
                info!("Initializing Markdown render style");
                RenderStyle::press_release()
            })
            .await
    }

    fn write_document(style: &RenderStyle, document: &DocumentSnapshot) -> String {
        let mut out = String::new();

        if !document.title.trim().is_empty() {
            let _ = writeln!(out, "# {}\n", document.title.trim());
        }
        if !document.introduction.trim().is_empty() {
            let _ = writeln!(out, "{}\n", document.introduction.trim());
        }

        for section in document.sections.iter().filter(|s| !s.content.trim().is_empty()) {
            if !section.heading.trim().is_empty() {
                let _ = writeln!(out, "## {}\n", section.heading.trim());
            }
            let _ = writeln!(out, "{}\n", section.content.trim());
        }

        for image in document.images.iter().filter(|i| !i.url.trim().is_empty()) {
            let _ = writeln!(out, "![{}]({})\n", image.caption.trim(), image.url.trim());
        }

        let contact = &document.contact;
        let lines: Vec<String> = [
            (style.company_label, &contact.company_name),
            (style.person_label, &contact.person),
            (style.email_label, &contact.email),
            (style.phone_label, &contact.phone),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{label}: {}", value.trim()))
        .collect();

        if !lines.is_empty() {
            let _ = writeln!(out, "{}\n{}\n", style.rule, style.contact_heading);
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
        }

        out
    }
}

#[async_trait]
impl DocumentRenderer for MarkdownRenderer {
    async fn render(&self, document: &DocumentSnapshot) -> Result<Artifact, ExportError> {
        if !has_body(document) {
            return Err(ExportError::Render(
                "document has no title, introduction or section content".to_string(),
            ));
        }
        let style = self.style().await;
        let body = Self::write_document(style, document);
        debug!("Rendered {} bytes of Markdown", body.len());

        Ok(Artifact {
            content_type: "text/markdown; charset=utf-8",
            file_name: format!("{}.md", file_stem(&document.title)),
            bytes: body.into_bytes(),
        })
    }
}

/// Images and contact details alone do not make a press release.
fn has_body(document: &DocumentSnapshot) -> bool {
    !document.title.trim().is_empty()
        || !document.introduction.trim().is_empty()
        || document.sections.iter().any(|s| !s.content.trim().is_empty())
}

/// ASCII-safe file stem; non-ASCII titles fall back to a fixed name.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        stem
    }
}
