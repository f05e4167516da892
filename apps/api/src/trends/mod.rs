//! Trend collaborator: supplies current trend keywords, headlines and a
//! market-condition narrative for an industry or free-text query.
//!
//! Trend data is opaque, possibly stale input. Fetching never fails: any
//! upstream problem degrades to the fixed default snapshot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::build_http_client;

const TRENDS_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendSnapshot {
    pub keywords: Vec<String>,
    pub headlines: Vec<String>,
    pub market_condition: String,
}

impl TrendSnapshot {
    /// Fixed snapshot used when no trend source is reachable.
    pub fn default_snapshot() -> Self {
        Self {
            keywords: [
                "生成AI",
                "サステナビリティ",
                "DX推進",
                "ウェルビーイング",
                "インバウンド需要",
                "リスキリング",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            headlines: [
                "生成AIの業務活用が中小企業にも拡大",
                "脱炭素に向けた企業の取り組みが加速",
                "訪日客数が回復し地域消費が活性化",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            market_condition: "デジタル化と持続可能性への関心が高まり、\
                               新しい価値を提案する製品・サービスへの注目が続いています。"
                .to_string(),
        }
    }
}

#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch_trends(&self, query: &str) -> TrendSnapshot;
}

/// Always returns the default snapshot.
pub struct StaticTrendSource;

#[async_trait]
impl TrendSource for StaticTrendSource {
    async fn fetch_trends(&self, _query: &str) -> TrendSnapshot {
        TrendSnapshot::default_snapshot()
    }
}

/// Fetches `GET {endpoint}?q=<query>` and falls back to the default snapshot.
pub struct HttpTrendSource {
    client: Client,
    endpoint: String,
}

impl HttpTrendSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: build_http_client(Duration::from_secs(TRENDS_TIMEOUT_SECS)),
            endpoint: endpoint.into(),
        }
    }

    async fn try_fetch(&self, query: &str) -> Result<TrendSnapshot, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json::<TrendSnapshot>()
            .await
    }
}

#[async_trait]
impl TrendSource for HttpTrendSource {
    async fn fetch_trends(&self, query: &str) -> TrendSnapshot {
        match self.try_fetch(query).await {
            Ok(snapshot) if !snapshot.keywords.is_empty() => {
                debug!(
                    "Fetched {} trend keywords for '{query}'",
                    snapshot.keywords.len()
                );
                snapshot
            }
            Ok(_) => {
                warn!("Trend source returned no keywords for '{query}', using default snapshot");
                TrendSnapshot::default_snapshot()
            }
            Err(e) => {
                warn!("Trend fetch failed for '{query}', using default snapshot: {e}");
                TrendSnapshot::default_snapshot()
            }
        }
    }
}
