//! Template Fallback Generator: deterministic, non-AI synthesis.
//!
//! Used when no provider is configured, every provider failed, or extraction
//! produced nothing usable. Output is built only from fields already present in
//! the input via fixed Japanese templates: no network, no randomness, and it
//! never fails. There is deliberately no template for multiple title variants.

use crate::generation::angles::Angle;
use crate::generation::extractor::ProposalDraft;
use crate::models::document::DocumentSnapshot;
use crate::models::product::ProductInput;
use crate::trends::TrendSnapshot;

pub const GENERIC_RECOMMENDATION: &str =
    "製品の特長を素直に伝えられる切り口で、幅広いメディアに紹介しやすい構成です。";
pub const GENERIC_MEDIA_REACTION: &str =
    "業界専門メディアを中心に、新製品情報として一定の関心を集めることが見込まれます。";

const DEFAULT_COMPANY: &str = "当社";
const DEFAULT_SUBJECT: &str = "新たな取り組み";
const DEFAULT_HEADING: &str = "本件";

pub fn fallback_introduction(document: &DocumentSnapshot) -> String {
    let company = non_empty(&document.contact.company_name).unwrap_or(DEFAULT_COMPANY);
    let subject = non_empty(&document.title).unwrap_or(DEFAULT_SUBJECT);
    let mut text = format!("{company}は、{subject}についてお知らせいたします。");

    if let Some(sentence) = document
        .sections
        .iter()
        .find_map(|s| non_empty(&s.content))
        .map(first_sentence)
    {
        text.push_str(&sentence);
    }
    text
}

/// Existing content is kept as-is; an empty section gets a neutral lead-in.
pub fn fallback_section(
    document: &DocumentSnapshot,
    heading: &str,
    existing_content: Option<&str>,
) -> String {
    if let Some(content) = existing_content.and_then(non_empty) {
        return content.to_string();
    }
    let heading = non_empty(heading).unwrap_or(DEFAULT_HEADING);
    let subject = non_empty(&document.title).unwrap_or(DEFAULT_SUBJECT);
    format!("{heading}について、{subject}の詳細を以下にご紹介いたします。")
}

pub fn fallback_title(input: &ProductInput, trends: &TrendSnapshot, angle: Angle) -> String {
    let name = input.display_name();
    match angle {
        Angle::SocialIssue => format!("{name}、社会課題の解決に向けた新たな取り組みを開始"),
        Angle::TrendAligned => {
            let trend = trends
                .keywords
                .first()
                .and_then(|k| non_empty(k))
                .unwrap_or("最新トレンド");
            format!("{name}、「{trend}」の流れに応える新提案")
        }
        Angle::Seasonal => format!("この季節にこそ届けたい、{name}"),
        Angle::UniqueStory => format!("{name}誕生の舞台裏　開発チームが語る独自のこだわり"),
        Angle::IndustryInnovative => match non_empty(&input.industry) {
            Some(industry) => format!("{industry}業界に新風を吹き込む{name}"),
            None => format!("業界の常識を変える{name}"),
        },
    }
}

pub fn fallback_proposal(input: &ProductInput, trends: &TrendSnapshot, angle: Angle) -> ProposalDraft {
    let name = input.display_name();
    let company = non_empty(&input.company_name).unwrap_or(DEFAULT_COMPANY);

    let mut introduction = format!("{company}は、{name}を発表いたします。");
    if let Some(description) = non_empty(&input.description) {
        introduction.push_str(&ensure_period(description));
    }

    let market = non_empty(&trends.market_condition)
        .map(ensure_period)
        .unwrap_or_default();
    let background = match angle {
        Angle::SocialIssue => format!("{market}社会が抱える課題に対し、{name}は身近な解決策を提案します。"),
        Angle::TrendAligned => format!(
            "{market}{}といった関心の高まりを背景に、{name}は生まれました。",
            trends
                .keywords
                .iter()
                .take(2)
                .map(|k| format!("「{}」", k.trim()))
                .collect::<String>()
        ),
        Angle::Seasonal => format!("{market}季節の変わり目に合わせ、{name}をご紹介します。"),
        Angle::UniqueStory => format!("{market}{name}は、開発チームの試行錯誤から生まれました。"),
        Angle::IndustryInnovative => format!(
            "{market}{}の従来のやり方に一石を投じるのが{name}です。",
            non_empty(&input.industry).unwrap_or("業界")
        ),
    };

    let features: Vec<&str> = input.features.iter().filter_map(|f| non_empty(f)).collect();
    let development = if features.is_empty() {
        format!("{name}は、利用者の声をもとに開発されました。")
    } else {
        format!("{name}は、{}といった特長を備えています。", features.join("、"))
    };

    let recommendation = match angle {
        Angle::SocialIssue => "社会的意義を前面に出すことで、一般紙や社会面での掲載が期待できる切り口です。",
        Angle::TrendAligned => "いま注目されている話題と結びつけることで、記者が記事化しやすい切り口です。",
        Angle::Seasonal => "時期に合わせた話題性を持たせることで、季節特集に取り上げられやすい切り口です。",
        Angle::UniqueStory => "開発の背景や人物に焦点を当てることで、読み物として関心を集めやすい切り口です。",
        Angle::IndustryInnovative => "業界への影響を示すことで、専門メディアやビジネス誌に訴求しやすい切り口です。",
    };

    ProposalDraft {
        title: fallback_title(input, trends, angle),
        introduction,
        background,
        development,
        recommendation: recommendation.to_string(),
        expected_media_reaction: GENERIC_MEDIA_REACTION.to_string(),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Text up to and including the first "。", or the whole text with one appended.
fn first_sentence(text: &str) -> String {
    match text.find('。') {
        Some(idx) => text[..idx + '。'.len_utf8()].to_string(),
        None => ensure_period(text),
    }
}

fn ensure_period(text: &str) -> String {
    let text = text.trim();
    if text.ends_with('。') || text.ends_with('！') || text.ends_with('？') {
        text.to_string()
    } else {
        format!("{text}。")
    }
}
