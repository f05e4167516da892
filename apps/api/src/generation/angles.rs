use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five fixed narrative framings a proposal can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Angle {
    SocialIssue,
    TrendAligned,
    Seasonal,
    UniqueStory,
    IndustryInnovative,
}

impl Angle {
    /// Generation order; proposals are always returned in this order.
    pub const ALL: [Angle; 5] = [
        Angle::SocialIssue,
        Angle::TrendAligned,
        Angle::Seasonal,
        Angle::UniqueStory,
        Angle::IndustryInnovative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Angle::SocialIssue => "social-issue",
            Angle::TrendAligned => "trend-aligned",
            Angle::Seasonal => "seasonal",
            Angle::UniqueStory => "unique-story",
            Angle::IndustryInnovative => "industry-innovative",
        }
    }

    /// Label shown to users next to each proposal.
    pub fn label(&self) -> &'static str {
        match self {
            Angle::SocialIssue => "社会課題解決型",
            Angle::TrendAligned => "トレンド連動型",
            Angle::Seasonal => "季節・時事型",
            Angle::UniqueStory => "開発ストーリー型",
            Angle::IndustryInnovative => "業界革新型",
        }
    }

    /// Framing embedded in the angle prompt.
    pub fn framing(&self) -> &'static str {
        match self {
            Angle::SocialIssue => {
                "Position the product as a response to a social issue (environment, \
                 community, health, diversity, labour shortage). Lead with the problem \
                 society faces, then show how the product contributes to solving it."
            }
            Angle::TrendAligned => {
                "Tie the product directly to the current trend keywords and headlines. \
                 Explain why this product matters *now*, using the market-condition \
                 narrative as the hook."
            }
            Angle::Seasonal => {
                "Anchor the announcement to the season, an upcoming event, or a \
                 calendar moment so that media have a timely reason to cover it."
            }
            Angle::UniqueStory => {
                "Tell the development story: the founder's motivation, obstacles \
                 overcome, and what makes the product genuinely novel or first-of-its-kind."
            }
            Angle::IndustryInnovative => {
                "Frame the product as a change-maker for its industry: what conventional \
                 practice it disrupts and what new standard it proposes."
            }
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
