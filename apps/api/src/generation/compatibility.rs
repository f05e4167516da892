//! Compatibility scoring: heuristic topical overlap between a product and the
//! current trend keywords, evaluated per narrative angle.
//!
//! Pure and deterministic: the same (input, trend keywords, angle) always
//! yields the same assessment. Assessments are recomputed, never mutated.
//!
//! Components (additive, total clamped to 0..=100):
//! 1. industry tokens vs trend tokens → +30 on any hit
//! 2. top-10 description tokens (stop words removed, length > 1) vs trend tokens → +30
//! 3. feature prefix (first 3 chars) as substring of any trend keyword → +20
//! 4. angle-specific bonus → 0..=20

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::generation::angles::Angle;
use crate::models::product::ProductInput;

pub const COMPATIBILITY_THRESHOLD: u32 = 30;
pub const MAX_SCORE: u32 = 100;

const INDUSTRY_POINTS: u32 = 30;
const DESCRIPTION_POINTS: u32 = 30;
const FEATURE_POINTS: u32 = 20;
const ANGLE_POINTS: u32 = 20;
const SEASONAL_BASELINE_POINTS: u32 = 10;

const DESCRIPTION_TOKEN_LIMIT: usize = 10;
const FEATURE_PREFIX_CHARS: usize = 3;
const MIN_CONTAINED_CHARS: usize = 3;

const DELIMITERS: &[char] = &[
    ' ', '\t', '\n', '\r', '\u{3000}', ',', '.', '、', '。', '・', '/', '／', '|', '(', ')', '（',
    '）', '「', '」', '『', '』', '【', '】', '!', '?', '！', '？', ':', '：', ';', '；', '"', '\'',
    '-', '_', '&', '＆', '+', '＋', '~', '〜',
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "to", "in", "for", "with", "on", "by", "is", "are",
    "be", "it", "this", "that", "our", "we", "your", "you", "from", "as", "at", "を", "が",
    "は", "に", "の", "で", "と", "も", "へ", "や", "から", "まで", "する", "します", "した",
    "です", "ます", "こと", "もの", "ため", "など", "これ", "それ", "この", "その",
];

const SOCIAL_KEYWORDS: &[&str] = &[
    "社会", "環境", "サステナ", "sdgs", "持続可能", "脱炭素", "カーボン", "エコ", "地域",
    "地方創生", "課題", "多様性", "福祉", "介護", "子育て", "教育", "健康", "貧困", "防災",
    "人手不足", "social", "environment", "sustainab", "community", "climate",
];

const SEASONAL_KEYWORDS: &[&str] = &[
    "季節", "春", "夏", "秋", "冬", "梅雨", "年末", "年始", "正月", "新年", "新生活",
    "卒業", "入学", "お盆", "連休", "クリスマス", "バレンタイン", "ハロウィン", "母の日",
    "父の日", "season", "holiday", "summer", "winter", "spring", "autumn", "christmas",
];

const NOVELTY_KEYWORDS: &[&str] = &[
    "世界初", "日本初", "業界初", "初めて", "独自", "ユニーク", "特許", "オリジナル",
    "画期的", "前例", "唯一", "first", "unique", "novel", "patent", "original",
];

/// Result of scoring one angle. `reasons` order is fixed:
/// industry → description → feature → angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityAssessment {
    pub score: u32,
    pub is_compatible: bool,
    pub reasons: Vec<String>,
}

pub fn is_compatible_score(score: u32) -> bool {
    score >= COMPATIBILITY_THRESHOLD
}

/// Scores `input` against `trend_keywords` for `angle`.
pub fn assess(
    input: &ProductInput,
    trend_keywords: &[String],
    angle: Angle,
) -> CompatibilityAssessment {
    let trend_tokens: Vec<String> = trend_keywords.iter().flat_map(|k| tokenize(k)).collect();
    let trend_lower: Vec<String> = trend_keywords.iter().map(|k| k.to_lowercase()).collect();

    let mut score = 0;
    let mut reasons = Vec::new();

    let industry_tokens = tokenize(&input.industry);
    if let Some(hit) = first_overlap(&industry_tokens, &trend_tokens) {
        score += INDUSTRY_POINTS;
        reasons.push(format!(
            "Industry '{}' overlaps trend keyword '{hit}'",
            input.industry.trim()
        ));
    }

    let description_tokens = top_description_tokens(&input.description);
    if let Some(hit) = first_overlap(&description_tokens, &trend_tokens) {
        score += DESCRIPTION_POINTS;
        reasons.push(format!("Description relates to trend keyword '{hit}'"));
    }

    if let Some(feature) = input
        .features
        .iter()
        .find(|f| feature_matches(f, &trend_lower))
    {
        score += FEATURE_POINTS;
        reasons.push(format!("Feature '{}' matches a trend keyword", feature.trim()));
    }

    let (bonus, angle_reason) = angle_bonus(input, &trend_lower, angle);
    score += bonus;
    if let Some(reason) = angle_reason {
        reasons.push(reason);
    }

    let score = score.min(MAX_SCORE);
    CompatibilityAssessment {
        score,
        is_compatible: is_compatible_score(score),
        reasons,
    }
}

/// Lowercases and splits on the fixed delimiter set.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(DELIMITERS)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Up to ten description tokens, most frequent first, first occurrence breaking ties.
fn top_description_tokens(description: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokenize(description).into_iter().enumerate() {
        if token.chars().count() <= 1 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked
        .into_iter()
        .take(DESCRIPTION_TOKEN_LIMIT)
        .map(|(token, _)| token)
        .collect()
}

/// Tokens match when equal. Non-ASCII tokens of at least three characters may
/// also match by containment, since Japanese compounds are written without
/// delimiters ("クラウド" inside "クラウド移行"). ASCII tokens never do, so
/// "it" does not hit "digital".
fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    !short.is_ascii() && short.chars().count() >= MIN_CONTAINED_CHARS && long.contains(short)
}

fn first_overlap<'a>(tokens: &[String], trend_tokens: &'a [String]) -> Option<&'a str> {
    tokens.iter().find_map(|t| {
        trend_tokens
            .iter()
            .find(|k| tokens_match(t, k))
            .map(String::as_str)
    })
}

fn feature_matches(feature: &str, trend_lower: &[String]) -> bool {
    let prefix: String = feature
        .trim()
        .to_lowercase()
        .chars()
        .take(FEATURE_PREFIX_CHARS)
        .collect();
    !prefix.is_empty() && trend_lower.iter().any(|k| k.contains(&prefix))
}

fn angle_bonus(input: &ProductInput, trend_lower: &[String], angle: Angle) -> (u32, Option<String>) {
    match angle {
        Angle::SocialIssue => match keyword_hit(input, trend_lower, SOCIAL_KEYWORDS) {
            Some(hit) => (
                ANGLE_POINTS,
                Some(format!("Social-issue topic '{hit}' present")),
            ),
            None => (0, None),
        },
        Angle::TrendAligned => (
            ANGLE_POINTS,
            Some("Trend-aligned framing always connects to current trends".to_string()),
        ),
        Angle::Seasonal => match keyword_hit(input, trend_lower, SEASONAL_KEYWORDS) {
            Some(hit) => (ANGLE_POINTS, Some(format!("Seasonal hook '{hit}' present"))),
            None => (
                SEASONAL_BASELINE_POINTS,
                Some("Seasonal framing can be applied to any launch".to_string()),
            ),
        },
        Angle::UniqueStory => match keyword_hit(input, trend_lower, NOVELTY_KEYWORDS) {
            Some(hit) => (ANGLE_POINTS, Some(format!("Novelty signal '{hit}' present"))),
            None => (0, None),
        },
        Angle::IndustryInnovative => {
            if input.has_industry() {
                (
                    ANGLE_POINTS,
                    Some(format!(
                        "Industry '{}' gives an innovation frame",
                        input.industry.trim()
                    )),
                )
            } else {
                (0, None)
            }
        }
    }
}

/// First fixed keyword found in the product text or the trend keywords.
fn keyword_hit(
    input: &ProductInput,
    trend_lower: &[String],
    keywords: &[&'static str],
) -> Option<&'static str> {
    let mut haystack = format!(
        "{} {} {} {}",
        input.product_service_name,
        input.description,
        input.industry,
        input.features.join(" ")
    )
    .to_lowercase();
    for keyword in trend_lower {
        haystack.push(' ');
        haystack.push_str(keyword);
    }
    keywords.iter().copied().find(|k| haystack.contains(*k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn umbrella() -> ProductInput {
        ProductInput {
            product_service_name: "スマート傘".to_string(),
            description: "AIが雨を予測する傘".to_string(),
            industry: "IT".to_string(),
            features: vec!["AI予測".to_string(), "軽量".to_string()],
            ..Default::default()
        }
    }

    fn trends(keywords: &[&str]) -> Vec<String> {
        keywords.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_threshold_boundaries() {
        assert!(!is_compatible_score(29));
        assert!(is_compatible_score(30));
        assert!(is_compatible_score(31));
    }

    #[test]
    fn test_smart_umbrella_trend_aligned_scores_twenty() {
        let assessment = assess(
            &umbrella(),
            &trends(&["AI技術の進化", "サステナビリティ"]),
            Angle::TrendAligned,
        );
        assert_eq!(assessment.score, 20);
        assert!(!assessment.is_compatible);
        assert_eq!(assessment.reasons.len(), 1);
    }

    #[test]
    fn test_trend_aligned_bonus_is_unconditional() {
        let assessment = assess(&ProductInput::default(), &[], Angle::TrendAligned);
        assert_eq!(assessment.score, 20);
    }

    #[test]
    fn test_industry_hit_adds_thirty() {
        let input = ProductInput {
            industry: "IT".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["IT・人材不足"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 30);
        assert!(assessment.is_compatible);
        assert!(assessment.reasons[0].starts_with("Industry"));
    }

    #[test]
    fn test_ascii_tokens_need_exact_match() {
        let input = ProductInput {
            industry: "IT".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["Digital transformation"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 0);
        assert!(!assessment.is_compatible);

        let input = ProductInput {
            description: "an eco bag".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["economy recovery"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 0);
        assert!(assessment.reasons.is_empty());
    }

    #[test]
    fn test_japanese_compound_matches_by_containment() {
        let input = ProductInput {
            industry: "クラウド".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["クラウド移行"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 30);

        assert!(!tokens_match("it", "digital"));
        assert!(!tokens_match("eco", "economy"));
        assert!(!tokens_match("ai", "ai技術"));
        assert!(!tokens_match("夏", "夏休み"));
        assert!(tokens_match("クラウド", "クラウド移行"));
    }

    #[test]
    fn test_description_hit_ignores_stop_words_and_single_chars() {
        let input = ProductInput {
            description: "the a 雨".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["the rain"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 0);

        let input = ProductInput {
            description: "cloud storage for teams".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["cloud"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 30);
    }

    #[test]
    fn test_feature_prefix_substring_adds_twenty() {
        let input = ProductInput {
            features: vec!["サステナブル素材".to_string()],
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["サステナビリティ"]), Angle::UniqueStory);
        assert_eq!(assessment.score, 20);
        assert!(assessment.reasons[0].starts_with("Feature"));
    }

    #[test]
    fn test_seasonal_baseline_and_hit() {
        let input = ProductInput::default();
        assert_eq!(assess(&input, &[], Angle::Seasonal).score, 10);
        let input = ProductInput {
            description: "夏に涼しいシャツ".to_string(),
            ..Default::default()
        };
        assert_eq!(assess(&input, &[], Angle::Seasonal).score, 20);
    }

    #[test]
    fn test_social_issue_needs_topic_hit() {
        assert_eq!(assess(&ProductInput::default(), &[], Angle::SocialIssue).score, 0);
        let with_trend = assess(
            &ProductInput::default(),
            &trends(&["脱炭素経営"]),
            Angle::SocialIssue,
        );
        assert_eq!(with_trend.score, 20);
    }

    #[test]
    fn test_unique_story_needs_novelty_hit() {
        let input = ProductInput {
            description: "世界初の折りたたみ構造".to_string(),
            ..Default::default()
        };
        assert_eq!(assess(&input, &[], Angle::UniqueStory).score, 20);
    }

    #[test]
    fn test_industry_innovative_requires_industry() {
        assert_eq!(
            assess(&ProductInput::default(), &[], Angle::IndustryInnovative).score,
            0
        );
        assert_eq!(assess(&umbrella(), &[], Angle::IndustryInnovative).score, 20);
    }

    #[test]
    fn test_score_is_clamped_to_one_hundred() {
        let input = ProductInput {
            product_service_name: "エコボトル".to_string(),
            description: "sustainability bottle".to_string(),
            industry: "sustainability".to_string(),
            features: vec!["sustainable".to_string()],
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["sustainability"]), Angle::SocialIssue);
        // 30 + 30 + 20 + 20
        assert_eq!(assessment.score, 100);

        let assessment = assess(&input, &trends(&["sustainability"]), Angle::TrendAligned);
        assert_eq!(assessment.score, MAX_SCORE);
    }

    #[test]
    fn test_reason_order_is_fixed() {
        let input = ProductInput {
            description: "cloud backup".to_string(),
            industry: "cloud".to_string(),
            features: vec!["cloud sync".to_string()],
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["cloud"]), Angle::IndustryInnovative);
        let prefixes: Vec<&str> = assessment
            .reasons
            .iter()
            .map(|r| r.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(prefixes, vec!["Industry", "Description", "Feature", "Industry"]);
        assert!(assessment.reasons[3].contains("innovation"));

        // Description and angle only: relative order still holds.
        let input = ProductInput {
            description: "cloud backup".to_string(),
            ..Default::default()
        };
        let assessment = assess(&input, &trends(&["cloud"]), Angle::TrendAligned);
        assert_eq!(assessment.reasons.len(), 2);
        assert!(assessment.reasons[0].starts_with("Description"));
        assert!(assessment.reasons[1].starts_with("Trend-aligned"));
    }

    #[test]
    fn test_assessment_is_deterministic() {
        let keywords = trends(&["AI技術の進化", "サステナビリティ"]);
        for angle in Angle::ALL {
            assert_eq!(
                assess(&umbrella(), &keywords, angle),
                assess(&umbrella(), &keywords, angle)
            );
        }
    }

    #[test]
    fn test_tokenize_splits_on_japanese_and_ascii_delimiters() {
        assert_eq!(
            tokenize("AI・IoT、クラウド/Edge"),
            vec!["ai", "iot", "クラウド", "edge"]
        );
    }
}
