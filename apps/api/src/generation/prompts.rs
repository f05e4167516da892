//! Prompt Builder: one pure function per task kind.
//!
//! Every prompt states its output contract explicitly (free text or strict
//! JSON schema) and carries enough of the document for narrative consistency.
//! No network or parsing logic lives here.

use crate::generation::angles::Angle;
use crate::generation::compatibility::{CompatibilityAssessment, COMPATIBILITY_THRESHOLD};
use crate::llm_client::prompts::{
    JSON_ONLY_SYSTEM, PLAIN_TEXT_SYSTEM, PRESS_WRITER_PERSONA, STYLE_INSTRUCTION,
};
use crate::llm_client::Prompt;
use crate::models::document::DocumentSnapshot;
use crate::models::product::ProductInput;
use crate::trends::TrendSnapshot;

/// Section bodies are truncated to this many characters in document context.
const CONTEXT_SECTION_CHARS: usize = 400;

/// Title proposal prompt. Replace: {style_instruction}, {document_context}
pub const TITLE_PROMPT_TEMPLATE: &str = r#"{style_instruction}

Propose 5 press-release titles for the document below. Each title must take a
different approach (news value, customer benefit, numbers/facts, story, social
significance). Keep each title under 60 characters.

DOCUMENT:
{document_context}

Return a JSON ARRAY with this EXACT schema:
[
  {"title": "the headline", "approach": "one sentence explaining the approach"}
]"#;

/// Introduction (lead paragraph) prompt. Replace: {style_instruction}, {document_context}
pub const INTRODUCTION_PROMPT_TEMPLATE: &str = r#"{style_instruction}

Write the lead paragraph of the press release below. It must answer who, what,
when and why in 2 to 4 sentences (about 150 to 250 characters) and read
naturally after the title.

DOCUMENT:
{document_context}

OUTPUT: the paragraph text only."#;

/// Section body prompt.
/// Replace: {style_instruction}, {document_context}, {section_heading}, {section_task}
pub const SECTION_PROMPT_TEMPLATE: &str = r#"{style_instruction}

You are editing one section of the press release below.

DOCUMENT (other sections shown for consistency; do not repeat them):
{document_context}

SECTION HEADING: {section_heading}
{section_task}

OUTPUT: the section body text only, without the heading."#;

/// Angle proposal prompt.
/// Replace: {style_instruction}, {angle_label}, {angle_framing}, {product_context},
///          {trend_context}, {score}, {compatible}, {reasons}, {calibration}
pub const ANGLE_PROMPT_TEMPLATE: &str = r#"{style_instruction}

Draft a press-release proposal using the "{angle_label}" angle.

ANGLE FRAMING:
{angle_framing}

PRODUCT / SERVICE:
{product_context}

CURRENT TRENDS:
{trend_context}

COMPATIBILITY ASSESSMENT (heuristic, 0-100):
score: {score} (compatible: {compatible})
reasons:
{reasons}

{calibration}

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "press-release headline",
  "introduction": "lead paragraph, 2-4 sentences",
  "background": "market or social background that makes this newsworthy",
  "development": "development story or how the product works",
  "recommendation": "why this angle suits this product, one or two sentences",
  "expectedMediaReaction": "how journalists are likely to react and which media fit"
}"#;

pub fn build_title_prompt(document: &DocumentSnapshot) -> Prompt {
    Prompt {
        system: json_system(),
        user: fill_template(
            TITLE_PROMPT_TEMPLATE,
            &[
                ("style_instruction", STYLE_INSTRUCTION),
                ("document_context", &document_context(document, None)),
            ],
        ),
    }
}

pub fn build_introduction_prompt(document: &DocumentSnapshot) -> Prompt {
    Prompt {
        system: text_system(),
        user: fill_template(
            INTRODUCTION_PROMPT_TEMPLATE,
            &[
                ("style_instruction", STYLE_INSTRUCTION),
                ("document_context", &document_context(document, None)),
            ],
        ),
    }
}

pub fn build_section_prompt(
    document: &DocumentSnapshot,
    heading: &str,
    existing_content: Option<&str>,
) -> Prompt {
    let section_task = match existing_content.map(str::trim).filter(|c| !c.is_empty()) {
        Some(content) => format!(
            "CURRENT DRAFT:\n{content}\n\nImprove this draft: keep its facts, tighten the \
             wording, and make it flow with the rest of the document."
        ),
        None => "Write this section from scratch (about 200 to 400 characters), \
                 drawing only on facts present in the document."
            .to_string(),
    };

    Prompt {
        system: text_system(),
        user: fill_template(
            SECTION_PROMPT_TEMPLATE,
            &[
                ("style_instruction", STYLE_INSTRUCTION),
                ("document_context", &document_context(document, Some(heading))),
                ("section_heading", heading),
                ("section_task", &section_task),
            ],
        ),
    }
}

pub fn build_angle_prompt(
    input: &ProductInput,
    trends: &TrendSnapshot,
    angle: Angle,
    assessment: &CompatibilityAssessment,
) -> Prompt {
    let reasons = if assessment.reasons.is_empty() {
        "- no direct overlap found".to_string()
    } else {
        bullet_list(&assessment.reasons)
    };

    let calibration = if assessment.is_compatible {
        "The product has a solid link to current trends: state the connection with confidence."
            .to_string()
    } else {
        format!(
            "The score is below {COMPATIBILITY_THRESHOLD}: do NOT overstate the trend link. \
             Lead with the product's own merits and present any trend connection as an \
             emerging opportunity."
        )
    };

    Prompt {
        system: json_system(),
        user: fill_template(
            ANGLE_PROMPT_TEMPLATE,
            &[
                ("style_instruction", STYLE_INSTRUCTION),
                ("angle_label", angle.label()),
                ("angle_framing", angle.framing()),
                ("product_context", &product_context(input)),
                ("trend_context", &trend_context(trends)),
                ("score", &assessment.score.to_string()),
                ("compatible", &assessment.is_compatible.to_string()),
                ("reasons", &reasons),
                ("calibration", &calibration),
            ],
        ),
    }
}

/// Substitutes `{key}` placeholders in a single pass. Inserted values are
/// never rescanned, so user text containing `{score}` stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = values.iter().find(|(key, _)| {
            tail[1..]
                .strip_prefix(*key)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn json_system() -> String {
    format!("{PRESS_WRITER_PERSONA} {JSON_ONLY_SYSTEM}")
}

fn text_system() -> String {
    format!("{PRESS_WRITER_PERSONA} {PLAIN_TEXT_SYSTEM}")
}

/// Renders title, introduction, sections and company for prompt context.
/// `exclude_heading` drops the section currently being edited.
fn document_context(document: &DocumentSnapshot, exclude_heading: Option<&str>) -> String {
    let mut lines = vec![
        format!("Title: {}", or_unset(&document.title)),
        format!("Introduction: {}", or_unset(&document.introduction)),
    ];

    let sections: Vec<String> = document
        .other_sections(exclude_heading)
        .map(|s| {
            let body: String = s.content.trim().chars().take(CONTEXT_SECTION_CHARS).collect();
            format!("- {}: {}", or_unset(&s.heading), body)
        })
        .collect();
    if sections.is_empty() {
        lines.push("Sections: (none yet)".to_string());
    } else {
        lines.push("Sections:".to_string());
        lines.extend(sections);
    }

    if !document.contact.company_name.trim().is_empty() {
        lines.push(format!("Company: {}", document.contact.company_name.trim()));
    }
    lines.join("\n")
}

fn product_context(input: &ProductInput) -> String {
    let mut lines = vec![
        format!("Name: {}", input.display_name()),
        format!("Description: {}", or_unset(&input.description)),
        format!("Industry: {}", or_unset(&input.industry)),
    ];
    if !input.features.is_empty() {
        lines.push(format!("Features:\n{}", bullet_list(&input.features)));
    }
    if !input.target_audience.trim().is_empty() {
        lines.push(format!("Target audience: {}", input.target_audience.trim()));
    }
    if !input.company_name.trim().is_empty() {
        lines.push(format!("Company: {}", input.company_name.trim()));
    }
    lines.join("\n")
}

fn trend_context(trends: &TrendSnapshot) -> String {
    let mut lines = vec![format!("Keywords: {}", trends.keywords.join(", "))];
    if !trends.headlines.is_empty() {
        lines.push(format!("Headlines:\n{}", bullet_list(&trends.headlines)));
    }
    if !trends.market_condition.trim().is_empty() {
        lines.push(format!("Market condition: {}", trends.market_condition.trim()));
    }
    lines.join("\n")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {}", i.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_unset(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
