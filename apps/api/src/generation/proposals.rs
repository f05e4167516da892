//! Proposal Orchestrator: drives scoring, prompting, generation and
//! extraction across the five fixed angles.
//!
//! Per angle: Pending → Scoring → Prompting → Generating → Extracting →
//! (Accepted | Fallback) → Done. Angles are independent and run concurrently;
//! stages within an angle run strictly in sequence. Dropping the returned
//! future drops every in-flight provider request.

use std::cmp::Reverse;
use std::fmt;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::generation::angles::Angle;
use crate::generation::compatibility::{assess, CompatibilityAssessment};
use crate::generation::extractor::{extract, ProposalDraft};
use crate::generation::prompts::build_angle_prompt;
use crate::generation::templates::{
    fallback_proposal, fallback_title, GENERIC_MEDIA_REACTION, GENERIC_RECOMMENDATION,
};
use crate::generation::GenerationSource;
use crate::llm_client::{GenerationParams, ProviderPreference, ProviderRouter};
use crate::models::document::{DocumentSnapshot, Section};
use crate::models::product::ProductInput;
use crate::trends::TrendSnapshot;

/// Proposals scoring below this are skipped (when AI is available) and
/// dropped by the final safety net.
pub const MIN_PROPOSAL_SCORE: u32 = 10;

pub const BACKGROUND_HEADING: &str = "開発の背景";
pub const DEVELOPMENT_HEADING: &str = "開発ストーリー";

const PROPOSAL_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 2048,
    temperature: 0.8,
};

/// A full draft for one angle, ready to preview or adopt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub angle: Angle,
    pub title: String,
    pub introduction: String,
    pub background: String,
    pub development: String,
    pub recommendation: String,
    pub expected_media_reaction: String,
    pub compatibility_score: u32,
    pub is_compatible: bool,
    pub reasons: Vec<String>,
    pub source: GenerationSource,
    pub document: DocumentSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleStage {
    Pending,
    Scoring,
    Prompting,
    Generating,
    Extracting,
    Accepted,
    Fallback,
    Done,
}

impl fmt::Display for AngleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(angle: Angle, stage: AngleStage) {
    debug!("[{angle}] → {stage}");
}

#[derive(Clone)]
pub struct ProposalOrchestrator {
    router: ProviderRouter,
}

impl ProposalOrchestrator {
    pub fn new(router: ProviderRouter) -> Self {
        Self { router }
    }

    /// Generates one proposal per angle, in `Angle::ALL` order.
    ///
    /// Never fails: any provider or extraction failure for an angle falls back
    /// to the template generator for that angle.
    pub async fn generate_proposals(
        &self,
        input: &ProductInput,
        trends: &TrendSnapshot,
        base: &DocumentSnapshot,
        preference: ProviderPreference,
    ) -> Vec<Proposal> {
        let ai_available = self.router.has_configured_provider();
        info!(
            "Generating proposals for '{}' (ai_available={ai_available})",
            input.display_name()
        );

        let runs = Angle::ALL
            .iter()
            .map(|&angle| self.run_angle(angle, input, trends, base, preference, ai_available));
        let proposals: Vec<Proposal> = join_all(runs).await.into_iter().flatten().collect();

        let proposals = apply_score_floor(proposals);
        info!("Produced {} proposal(s)", proposals.len());
        proposals
    }

    async fn run_angle(
        &self,
        angle: Angle,
        input: &ProductInput,
        trends: &TrendSnapshot,
        base: &DocumentSnapshot,
        preference: ProviderPreference,
        ai_available: bool,
    ) -> Option<Proposal> {
        enter(angle, AngleStage::Pending);

        enter(angle, AngleStage::Scoring);
        let assessment = assess(input, &trends.keywords, angle);

        if should_skip(&assessment, angle, ai_available) {
            info!(
                "[{angle}] skipped: score {} below {MIN_PROPOSAL_SCORE}",
                assessment.score
            );
            enter(angle, AngleStage::Done);
            return None;
        }

        let (draft, source) = match self
            .generate_draft(angle, input, trends, &assessment, preference)
            .await
        {
            Some((draft, source)) => {
                enter(angle, AngleStage::Accepted);
                (fill_missing_fields(draft, input, trends, angle), source)
            }
            None => {
                enter(angle, AngleStage::Fallback);
                (
                    fallback_proposal(input, trends, angle),
                    GenerationSource::Template,
                )
            }
        };

        enter(angle, AngleStage::Done);
        Some(build_proposal(angle, draft, source, &assessment, input, base))
    }

    async fn generate_draft(
        &self,
        angle: Angle,
        input: &ProductInput,
        trends: &TrendSnapshot,
        assessment: &CompatibilityAssessment,
        preference: ProviderPreference,
    ) -> Option<(ProposalDraft, GenerationSource)> {
        enter(angle, AngleStage::Prompting);
        let prompt = build_angle_prompt(input, trends, angle, assessment);

        enter(angle, AngleStage::Generating);
        let result = match self
            .router
            .generate(&prompt, &PROPOSAL_PARAMS, preference)
            .await
        {
            Ok(result) => result,
            Err(e) if e.is_missing_credentials() => {
                debug!("[{angle}] no provider available, using template");
                return None;
            }
            Err(e) => {
                warn!("[{angle}] generation failed, using template: {e}");
                return None;
            }
        };

        enter(angle, AngleStage::Extracting);
        match extract::<ProposalDraft>(&result.text) {
            Ok(draft) => Some((draft, GenerationSource::from_result(&result))),
            Err(e) => {
                warn!("[{angle}] extraction failed, using template: {e}");
                None
            }
        }
    }
}

/// Low-scoring angles are skipped only when AI is available; trend-aligned is
/// compatible by definition and never skipped.
fn should_skip(assessment: &CompatibilityAssessment, angle: Angle, ai_available: bool) -> bool {
    assessment.score < MIN_PROPOSAL_SCORE && ai_available && angle != Angle::TrendAligned
}

fn fill_missing_fields(
    mut draft: ProposalDraft,
    input: &ProductInput,
    trends: &TrendSnapshot,
    angle: Angle,
) -> ProposalDraft {
    let blank = |s: &str| s.trim().is_empty();
    if blank(&draft.title) {
        draft.title = fallback_title(input, trends, angle);
    }
    if blank(&draft.recommendation) {
        draft.recommendation = GENERIC_RECOMMENDATION.to_string();
    }
    if blank(&draft.expected_media_reaction) {
        draft.expected_media_reaction = GENERIC_MEDIA_REACTION.to_string();
    }
    draft
}

fn build_proposal(
    angle: Angle,
    draft: ProposalDraft,
    source: GenerationSource,
    assessment: &CompatibilityAssessment,
    input: &ProductInput,
    base: &DocumentSnapshot,
) -> Proposal {
    let document = compose_document(base, &draft, input);
    Proposal {
        id: Uuid::new_v4(),
        angle,
        title: draft.title,
        introduction: draft.introduction,
        background: draft.background,
        development: draft.development,
        recommendation: draft.recommendation,
        expected_media_reaction: draft.expected_media_reaction,
        compatibility_score: assessment.score.min(100),
        is_compatible: assessment.is_compatible,
        reasons: assessment.reasons.clone(),
        source,
        document,
    }
}

/// Builds the preview document: the base document with title and introduction
/// replaced and background/development sections placed first.
pub fn compose_document(
    base: &DocumentSnapshot,
    draft: &ProposalDraft,
    input: &ProductInput,
) -> DocumentSnapshot {
    let mut document = base.clone();
    document.title = draft.title.clone();
    document.introduction = draft.introduction.clone();

    document
        .sections
        .retain(|s| s.heading != BACKGROUND_HEADING && s.heading != DEVELOPMENT_HEADING);
    let generated = [
        (BACKGROUND_HEADING, &draft.background),
        (DEVELOPMENT_HEADING, &draft.development),
    ]
    .into_iter()
    .filter(|(_, content)| !content.trim().is_empty())
    .map(|(heading, content)| Section::new(heading, content.trim()));
    document.sections.splice(0..0, generated);

    if document.contact.company_name.trim().is_empty() {
        document.contact.company_name = input.company_name.trim().to_string();
    }
    document
}

/// Second safety net: drop proposals below the floor, but never turn a
/// non-empty list into an empty one; keep the single best instead.
pub fn apply_score_floor(proposals: Vec<Proposal>) -> Vec<Proposal> {
    let best = proposals
        .iter()
        .enumerate()
        .max_by_key(|(i, p)| (p.compatibility_score, Reverse(*i)))
        .map(|(_, p)| p.clone());

    let kept: Vec<Proposal> = proposals
        .into_iter()
        .filter(|p| p.compatibility_score >= MIN_PROPOSAL_SCORE)
        .collect();

    match best {
        Some(best) if kept.is_empty() => {
            warn!(
                "All proposals scored below {MIN_PROPOSAL_SCORE}; keeping best ({})",
                best.angle
            );
            vec![best]
        }
        _ => kept,
    }
}
