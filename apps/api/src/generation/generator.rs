//! Task-level generation: titles, introduction and section text.
//!
//! Introduction and section always return something usable: any router or
//! extraction failure drops to the template generator. Titles have no
//! template, so their failures surface as a `GenerationError`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::extractor::{extract, TitleProposal};
use crate::generation::prompts::{
    build_introduction_prompt, build_section_prompt, build_title_prompt,
};
use crate::generation::proposals::{Proposal, ProposalOrchestrator};
use crate::generation::templates::{fallback_introduction, fallback_section};
use crate::generation::{GenerationError, GenerationSource, TaskKind};
use crate::llm_client::{GenerationParams, Prompt, ProviderPreference, ProviderRouter};
use crate::models::document::DocumentSnapshot;
use crate::models::product::ProductInput;
use crate::trends::TrendSnapshot;

const MAX_TITLE_PROPOSALS: usize = 5;

const TITLE_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 1024,
    temperature: 0.9,
};

const TEXT_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 2048,
    temperature: 0.7,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / response models
// ────────────────────────────────────────────────────────────────────────────

/// One user action. Transient, never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub task: TaskKind,
    #[serde(default)]
    pub document: DocumentSnapshot,
    #[serde(default)]
    pub section_heading: Option<String>,
    #[serde(default)]
    pub section_content: Option<String>,
    /// Angle-proposal only; derived from the document when absent.
    #[serde(default)]
    pub product: Option<ProductInput>,
    /// Angle-proposal only; the fixed default snapshot when absent.
    #[serde(default)]
    pub trends: Option<TrendSnapshot>,
    #[serde(default)]
    pub provider: ProviderPreference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedText {
    pub text: String,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleProposals {
    pub proposals: Vec<TitleProposal>,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "task", rename_all = "kebab-case")]
pub enum GenerationOutput {
    Title(TitleProposals),
    Introduction(GeneratedText),
    Section(GeneratedText),
    AngleProposal { proposals: Vec<Proposal> },
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ContentGenerator {
    router: ProviderRouter,
    orchestrator: ProposalOrchestrator,
}

impl ContentGenerator {
    pub fn new(router: ProviderRouter) -> Self {
        Self {
            orchestrator: ProposalOrchestrator::new(router.clone()),
            router,
        }
    }

    pub fn orchestrator(&self) -> &ProposalOrchestrator {
        &self.orchestrator
    }

    /// Dispatches a request by task kind.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let document = &request.document;
        match request.task {
            TaskKind::Title => self
                .generate_titles(document, request.provider)
                .await
                .map(GenerationOutput::Title),
            TaskKind::Introduction => Ok(GenerationOutput::Introduction(
                self.generate_introduction(document, request.provider).await,
            )),
            TaskKind::Section => {
                let heading = request
                    .section_heading
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        GenerationError::InvalidRequest(
                            "sectionHeading is required for the section task".to_string(),
                        )
                    })?;
                Ok(GenerationOutput::Section(
                    self.generate_section(
                        document,
                        heading,
                        request.section_content.as_deref(),
                        request.provider,
                    )
                    .await,
                ))
            }
            TaskKind::AngleProposal => {
                let product = request
                    .product
                    .clone()
                    .unwrap_or_else(|| product_from_document(document));
                let trends = request
                    .trends
                    .clone()
                    .unwrap_or_else(TrendSnapshot::default_snapshot);
                let proposals = self
                    .orchestrator
                    .generate_proposals(&product, &trends, document, request.provider)
                    .await;
                if proposals.is_empty() {
                    return Err(GenerationError::NoUsableOutput);
                }
                Ok(GenerationOutput::AngleProposal { proposals })
            }
        }
    }

    /// Up to five title variants. Fatal on any failure: there is no template
    /// for multiple titles.
    pub async fn generate_titles(
        &self,
        document: &DocumentSnapshot,
        preference: ProviderPreference,
    ) -> Result<TitleProposals, GenerationError> {
        let prompt = build_title_prompt(document);
        let result = self
            .router
            .generate(&prompt, &TITLE_PARAMS, preference)
            .await
            .map_err(|e| {
                warn!("Title generation failed: {e}");
                GenerationError::from(e)
            })?;

        let mut proposals: Vec<TitleProposal> = extract(&result.text)?;
        proposals.retain(|p| !p.title.trim().is_empty());
        proposals.truncate(MAX_TITLE_PROPOSALS);
        if proposals.is_empty() {
            return Err(GenerationError::NoUsableOutput);
        }

        info!(
            "Generated {} title proposal(s) with {}",
            proposals.len(),
            result.provider
        );
        Ok(TitleProposals {
            proposals,
            source: GenerationSource::from_result(&result),
        })
    }

    pub async fn generate_introduction(
        &self,
        document: &DocumentSnapshot,
        preference: ProviderPreference,
    ) -> GeneratedText {
        let prompt = build_introduction_prompt(document);
        match self.generate_text(&prompt, preference, "introduction").await {
            Some(generated) => generated,
            None => GeneratedText {
                text: fallback_introduction(document),
                source: GenerationSource::Template,
            },
        }
    }

    pub async fn generate_section(
        &self,
        document: &DocumentSnapshot,
        heading: &str,
        existing_content: Option<&str>,
        preference: ProviderPreference,
    ) -> GeneratedText {
        let prompt = build_section_prompt(document, heading, existing_content);
        match self.generate_text(&prompt, preference, "section").await {
            Some(generated) => generated,
            None => GeneratedText {
                text: fallback_section(document, heading, existing_content),
                source: GenerationSource::Template,
            },
        }
    }

    async fn generate_text(
        &self,
        prompt: &Prompt,
        preference: ProviderPreference,
        what: &str,
    ) -> Option<GeneratedText> {
        let result = match self.router.generate(prompt, &TEXT_PARAMS, preference).await {
            Ok(result) => result,
            Err(e) => {
                warn!("{what} generation failed, using template: {e}");
                return None;
            }
        };
        match extract::<String>(&result.text) {
            Ok(text) => Some(GeneratedText {
                text,
                source: GenerationSource::from_result(&result),
            }),
            Err(e) => {
                warn!("{what} output unusable, using template: {e}");
                None
            }
        }
    }
}

/// Minimal product description recovered from an existing document.
fn product_from_document(document: &DocumentSnapshot) -> ProductInput {
    ProductInput {
        product_service_name: document.title.trim().to_string(),
        description: document.introduction.trim().to_string(),
        company_name: document.contact.company_name.trim().to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::llm_client::{LlmProvider, ProviderError, ProviderKind};
    use crate::models::document::Section;

    fn generator(providers: Vec<Arc<ScriptedProvider>>) -> ContentGenerator {
        ContentGenerator::new(ProviderRouter::new(
            providers
                .into_iter()
                .map(|p| p as Arc<dyn LlmProvider>)
                .collect(),
        ))
    }

    fn replying(text: &str) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::always(
            ProviderKind::Gemini,
            Ok(text.to_string()),
        ))
    }

    fn failing() -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::always(
            ProviderKind::Gemini,
            Err(ProviderError::AuthRejected {
                provider: ProviderKind::Gemini,
                message: "bad key".to_string(),
            }),
        ))
    }

    fn document() -> DocumentSnapshot {
        DocumentSnapshot {
            title: "スマート傘を発売".to_string(),
            introduction: "AIが雨を予測する傘です。".to_string(),
            sections: vec![Section::new("製品概要", "軽量で持ち運びやすい設計です。")],
            ..Default::default()
        }
    }

    fn request(task: TaskKind) -> GenerationRequest {
        GenerationRequest {
            task,
            document: document(),
            section_heading: None,
            section_content: None,
            product: None,
            trends: None,
            provider: ProviderPreference::Auto,
        }
    }

    #[tokio::test]
    async fn test_titles_parsed_and_capped() {
        let reply = "1. 一つ目のタイトル案\n2. 二つ目のタイトル案\n3. 三つ目のタイトル案\n\
                     4. 四つ目のタイトル案\n5. 五つ目のタイトル案\n6. 六つ目のタイトル案";
        let titles = generator(vec![replying(reply)])
            .generate_titles(&document(), ProviderPreference::Auto)
            .await
            .unwrap();
        assert_eq!(titles.proposals.len(), 5);
        assert_eq!(titles.proposals[0].title, "一つ目のタイトル案");
        assert!(matches!(titles.source, GenerationSource::Ai { .. }));
    }

    #[tokio::test]
    async fn test_titles_without_provider_is_distinct_error() {
        let err = generator(vec![])
            .generate_titles(&document(), ProviderPreference::Auto)
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::NoProviderConfigured);
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_titles_provider_failure_is_fatal() {
        let err = generator(vec![failing()])
            .generate_titles(&document(), ProviderPreference::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::ProviderFailed(_)));
    }

    #[tokio::test]
    async fn test_titles_explicit_unconfigured_provider() {
        let err = generator(vec![replying("1. タイトル案です")])
            .generate_titles(&document(), ProviderPreference::Anthropic)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingCredential(ProviderKind::Anthropic)
        );
    }

    #[tokio::test]
    async fn test_introduction_uses_ai_text_when_available() {
        let generated = generator(vec![replying("  生成された導入文です。\n")])
            .generate_introduction(&document(), ProviderPreference::Auto)
            .await;
        assert_eq!(generated.text, "生成された導入文です。");
        assert_eq!(
            generated.source,
            GenerationSource::Ai {
                provider: ProviderKind::Gemini,
                model: "gemini-model".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_introduction_falls_back_to_template() {
        let generated = generator(vec![failing()])
            .generate_introduction(&document(), ProviderPreference::Auto)
            .await;
        assert_eq!(generated.source, GenerationSource::Template);
        assert_eq!(generated.text, fallback_introduction(&document()));
    }

    #[tokio::test]
    async fn test_blank_ai_text_falls_back_for_section() {
        let generated = generator(vec![replying("   ")])
            .generate_section(&document(), "価格", None, ProviderPreference::Auto)
            .await;
        assert_eq!(generated.source, GenerationSource::Template);
        assert!(!generated.text.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_section_requires_heading() {
        let err = generator(vec![])
            .generate(&request(TaskKind::Section))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));

        let mut with_heading = request(TaskKind::Section);
        with_heading.section_heading = Some("価格".to_string());
        with_heading.section_content = Some("9,800円（税込）".to_string());
        let output = generator(vec![]).generate(&with_heading).await.unwrap();
        match output {
            GenerationOutput::Section(text) => assert_eq!(text.text, "9,800円（税込）"),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_angle_proposal_without_providers() {
        let output = generator(vec![])
            .generate(&request(TaskKind::AngleProposal))
            .await
            .unwrap();
        match output {
            GenerationOutput::AngleProposal { proposals } => {
                assert!(!proposals.is_empty());
                assert!(proposals
                    .iter()
                    .all(|p| p.source == GenerationSource::Template));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"task":"section","sectionHeading":"価格","provider":"openai"}"#,
        )
        .unwrap();
        assert_eq!(request.task, TaskKind::Section);
        assert_eq!(request.section_heading.as_deref(), Some("価格"));
        assert_eq!(request.provider, ProviderPreference::OpenAi);
        assert_eq!(request.document, DocumentSnapshot::default());
    }

    #[test]
    fn test_output_is_tagged_by_task() {
        let output = GenerationOutput::Introduction(GeneratedText {
            text: "本文".to_string(),
            source: GenerationSource::Template,
        });
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["task"], "introduction");
        assert_eq!(json["text"], "本文");
        assert_eq!(json["source"]["kind"], "template");
    }
}
