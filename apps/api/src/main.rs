mod config;
mod db;
mod documents;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
mod trends;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::documents::export::MarkdownRenderer;
use crate::documents::PgDocumentStore;
use crate::generation::generator::ContentGenerator;
use crate::llm_client::ProviderRouter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::trends::{HttpTrendSource, StaticTrendSource, TrendSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pressroom API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize provider chain; missing credentials are not an error
    let router = ProviderRouter::from_config(&config);
    for status in router.statuses() {
        info!(
            "Provider {}: {}",
            status.provider,
            if status.configured { "configured" } else { "not configured" }
        );
    }
    if !router.has_configured_provider() {
        warn!("No AI provider configured; generation will use templates only");
    }

    let trends: Arc<dyn TrendSource> = match &config.trends_api_url {
        Some(url) => {
            info!("Trend source: {url}");
            Arc::new(HttpTrendSource::new(url.clone()))
        }
        None => {
            info!("Trend source: static default snapshot");
            Arc::new(StaticTrendSource)
        }
    };

    // Build app state
    let state = AppState {
        generator: ContentGenerator::new(router.clone()),
        router,
        trends,
        store: Arc::new(PgDocumentStore::new(db)),
        renderer: Arc::new(MarkdownRenderer::new()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the editor's deployment origin is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
