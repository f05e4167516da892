use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{
    GeneratedText, GenerationOutput, GenerationRequest, TitleProposals,
};
use crate::generation::proposals::Proposal;
use crate::generation::TaskKind;
use crate::llm_client::{ProviderPreference, ProviderStatus};
use crate::models::document::DocumentSnapshot;
use crate::models::product::ProductInput;
use crate::state::AppState;
use crate::trends::TrendSnapshot;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub document: DocumentSnapshot,
    #[serde(default)]
    pub provider: ProviderPreference,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRequest {
    #[serde(default)]
    pub document: DocumentSnapshot,
    pub section_heading: String,
    #[serde(default)]
    pub section_content: Option<String>,
    #[serde(default)]
    pub provider: ProviderPreference,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub input: ProductInput,
    #[serde(default)]
    pub trends: Option<TrendSnapshot>,
    #[serde(default)]
    pub document: DocumentSnapshot,
    #[serde(default)]
    pub provider: ProviderPreference,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    pub proposals: Vec<Proposal>,
    pub trends: TrendSnapshot,
}

#[derive(Deserialize)]
pub struct TrendQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderStatus>,
    pub any_configured: bool,
}

/// POST /api/v1/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<GenerationOutput>, AppError> {
    let output = state.generator.generate(&req).await?;
    Ok(Json(output))
}

/// POST /api/v1/generate/titles
pub async fn handle_generate_titles(
    State(state): State<AppState>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TitleProposals>, AppError> {
    let titles = state
        .generator
        .generate_titles(&req.document, req.provider)
        .await?;
    Ok(Json(titles))
}

/// POST /api/v1/generate/introduction
pub async fn handle_generate_introduction(
    State(state): State<AppState>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<GeneratedText>, AppError> {
    let generated = state
        .generator
        .generate_introduction(&req.document, req.provider)
        .await;
    Ok(Json(generated))
}

/// POST /api/v1/generate/section
pub async fn handle_generate_section(
    State(state): State<AppState>,
    Json(req): Json<SectionRequest>,
) -> Result<Json<GeneratedText>, AppError> {
    let request = GenerationRequest {
        task: TaskKind::Section,
        document: req.document,
        section_heading: Some(req.section_heading),
        section_content: req.section_content,
        product: None,
        trends: None,
        provider: req.provider,
    };
    match state.generator.generate(&request).await? {
        GenerationOutput::Section(generated) => Ok(Json(generated)),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "section task produced a different output kind"
        ))),
    }
}

/// POST /api/v1/proposals
pub async fn handle_generate_proposals(
    State(state): State<AppState>,
    Json(req): Json<ProposalRequest>,
) -> Result<Json<ProposalResponse>, AppError> {
    let trends = match req.trends {
        Some(trends) => trends,
        None => state.trends.fetch_trends(req.input.industry.trim()).await,
    };

    let proposals = state
        .generator
        .orchestrator()
        .generate_proposals(&req.input, &trends, &req.document, req.provider)
        .await;
    info!(
        "Returning {} proposal(s) for '{}'",
        proposals.len(),
        req.input.display_name()
    );
    Ok(Json(ProposalResponse { proposals, trends }))
}

/// GET /api/v1/trends
pub async fn handle_get_trends(
    State(state): State<AppState>,
    Query(params): Query<TrendQuery>,
) -> Json<TrendSnapshot> {
    Json(state.trends.fetch_trends(params.q.trim()).await)
}

/// GET /api/v1/providers
pub async fn handle_list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.router.statuses(),
        any_configured: state.router.has_configured_provider(),
    })
}
