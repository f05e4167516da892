//! Response extraction: turns free-form model output into structured results.
//!
//! Models are asked for JSON but are not bound to produce it. Each shape is
//! extracted by an ordered chain of strategies; every strategy either yields a
//! result or "no match", and the first match wins. `MalformedOutput` is only
//! returned once the whole chain is exhausted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 200;
const MAX_LINE_PROPOSALS: usize = 5;

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\*\*)?\s*(?:\(?\d{1,2}(?:[.)．、:：）]|\s)|[-*•・●■◆])\s*(?P<body>.+)$")
        .expect("list marker regex is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("model output could not be read as {0}")]
    MalformedOutput(&'static str),
}

/// A single title variant with the approach it takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleProposal {
    pub title: String,
    #[serde(default, alias = "description", alias = "reason")]
    pub approach: String,
}

/// Fields an angle proposal prompt asks for. Missing fields deserialize empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalDraft {
    pub title: String,
    pub introduction: String,
    pub background: String,
    pub development: String,
    pub recommendation: String,
    #[serde(alias = "expected_media_reaction", alias = "expectedReaction")]
    pub expected_media_reaction: String,
}

impl ProposalDraft {
    fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() || !self.introduction.trim().is_empty()
    }
}

/// An output shape the extractor can produce. The shape a caller expects is
/// the type it asks for: `String`, `Vec<TitleProposal>` or `ProposalDraft`.
pub trait Extractable: Sized {
    fn extract_from(raw: &str) -> Result<Self, ExtractError>;
}

impl Extractable for String {
    fn extract_from(raw: &str) -> Result<Self, ExtractError> {
        extract_text(raw)
    }
}

impl Extractable for Vec<TitleProposal> {
    fn extract_from(raw: &str) -> Result<Self, ExtractError> {
        extract_titles(raw)
    }
}

impl Extractable for ProposalDraft {
    fn extract_from(raw: &str) -> Result<Self, ExtractError> {
        extract_proposal(raw)
    }
}

/// One attempt in an extraction chain.
pub struct Strategy<T> {
    pub name: &'static str,
    pub attempt: fn(&str) -> Option<T>,
}

pub const TITLE_STRATEGIES: &[Strategy<Vec<TitleProposal>>] = &[
    Strategy {
        name: "direct_json",
        attempt: titles_direct_json,
    },
    Strategy {
        name: "fenced_block",
        attempt: titles_fenced_block,
    },
    Strategy {
        name: "brace_span",
        attempt: titles_brace_span,
    },
    Strategy {
        name: "list_lines",
        attempt: titles_list_lines,
    },
    Strategy {
        name: "first_line",
        attempt: titles_first_line,
    },
];

pub const PROPOSAL_STRATEGIES: &[Strategy<ProposalDraft>] = &[
    Strategy {
        name: "direct_json",
        attempt: draft_direct_json,
    },
    Strategy {
        name: "fenced_block",
        attempt: draft_fenced_block,
    },
    Strategy {
        name: "brace_span",
        attempt: draft_brace_span,
    },
];

pub fn extract<T: Extractable>(raw: &str) -> Result<T, ExtractError> {
    T::extract_from(raw)
}

pub fn extract_text(raw: &str) -> Result<String, ExtractError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractError::MalformedOutput("text"));
    }
    Ok(text.to_string())
}

pub fn extract_titles(raw: &str) -> Result<Vec<TitleProposal>, ExtractError> {
    run_chain(raw, TITLE_STRATEGIES, "title proposals")
}

pub fn extract_proposal(raw: &str) -> Result<ProposalDraft, ExtractError> {
    run_chain(raw, PROPOSAL_STRATEGIES, "a proposal")
}

fn run_chain<T>(
    raw: &str,
    chain: &[Strategy<T>],
    what: &'static str,
) -> Result<T, ExtractError> {
    for strategy in chain {
        if let Some(result) = (strategy.attempt)(raw) {
            debug!("Extracted {what} via {}", strategy.name);
            return Ok(result);
        }
    }
    debug!("No extraction strategy matched {what}");
    Err(ExtractError::MalformedOutput(what))
}

// ────────────────────────────────────────────────────────────────────────────
// Text locators
// ────────────────────────────────────────────────────────────────────────────

/// Interior of the first ``` fenced block, language tag removed.
fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after = raw[start + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let end = after.find("```")?;
    let inner = after[..end].trim();
    (!inner.is_empty()).then_some(inner)
}

/// Substring from the first `{` to the last `}`.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(text.trim()).ok()
}

// ────────────────────────────────────────────────────────────────────────────
// Title strategies
// ────────────────────────────────────────────────────────────────────────────

/// Accepts an array of objects or strings, or an object wrapping such an array.
fn titles_from_json(text: &str) -> Option<Vec<TitleProposal>> {
    let value: Value = parse_json(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match ["proposals", "titles", "items"]
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                }) {
                Some(items) => items,
                None if map.contains_key("title") => vec![Value::Object(map)],
                None => return None,
            }
        }
        _ => return None,
    };

    let titles: Vec<TitleProposal> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(title) => Some(TitleProposal {
                title,
                approach: String::new(),
            }),
            other => serde_json::from_value(other).ok(),
        })
        .filter(|t: &TitleProposal| !t.title.trim().is_empty())
        .collect();

    (!titles.is_empty()).then_some(titles)
}

fn titles_direct_json(raw: &str) -> Option<Vec<TitleProposal>> {
    titles_from_json(raw)
}

fn titles_fenced_block(raw: &str) -> Option<Vec<TitleProposal>> {
    titles_from_json(fenced_block(raw)?)
}

fn titles_brace_span(raw: &str) -> Option<Vec<TitleProposal>> {
    let span = brace_span(raw)?;
    // A bare object list ({..},{..}) only parses once re-wrapped as an array.
    titles_from_json(span).or_else(|| titles_from_json(&format!("[{span}]")))
}

fn titles_list_lines(raw: &str) -> Option<Vec<TitleProposal>> {
    let titles: Vec<TitleProposal> = raw
        .lines()
        .filter_map(|line| LIST_MARKER.captures(line))
        .filter_map(|caps| caps.name("body").map(|m| split_title_line(m.as_str())))
        .filter(|t| {
            let len = t.title.chars().count();
            (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len)
        })
        .take(MAX_LINE_PROPOSALS)
        .collect();

    (!titles.is_empty()).then_some(titles)
}

fn titles_first_line(raw: &str) -> Option<Vec<TitleProposal>> {
    let line = raw
        .lines()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with("```"))?;
    let body = LIST_MARKER
        .captures(line)
        .and_then(|caps| caps.name("body").map(|m| m.as_str()))
        .unwrap_or(line);
    let title: String = clean_title(body).chars().take(MAX_TITLE_CHARS).collect();
    if title.is_empty() {
        return None;
    }
    Some(vec![TitleProposal {
        title,
        approach: String::new(),
    }])
}

/// Splits `Title - approach` lines; otherwise the whole line is the title.
fn split_title_line(body: &str) -> TitleProposal {
    for separator in [" - ", " – ", " — "] {
        if let Some((title, approach)) = body.split_once(separator) {
            let title = clean_title(title);
            if !title.is_empty() {
                return TitleProposal {
                    title,
                    approach: approach.trim().to_string(),
                };
            }
        }
    }
    TitleProposal {
        title: clean_title(body),
        approach: String::new(),
    }
}

/// Strips markdown emphasis and surrounding quotes.
fn clean_title(text: &str) -> String {
    text.trim()
        .replace("**", "")
        .trim_matches(|c| matches!(c, '*' | '"' | '\'' | '「' | '」' | '『' | '』' | '“' | '”'))
        .trim()
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Proposal strategies
// ────────────────────────────────────────────────────────────────────────────

fn usable_draft(text: &str) -> Option<ProposalDraft> {
    parse_json::<ProposalDraft>(text).filter(ProposalDraft::is_usable)
}

fn draft_direct_json(raw: &str) -> Option<ProposalDraft> {
    usable_draft(raw)
}

fn draft_fenced_block(raw: &str) -> Option<ProposalDraft> {
    usable_draft(fenced_block(raw)?)
}

fn draft_brace_span(raw: &str) -> Option<ProposalDraft> {
    usable_draft(brace_span(raw)?)
}
