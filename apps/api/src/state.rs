use std::sync::Arc;

use crate::documents::export::DocumentRenderer;
use crate::documents::DocumentStore;
use crate::generation::generator::ContentGenerator;
use crate::llm_client::ProviderRouter;
use crate::trends::TrendSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub router: ProviderRouter,
    pub generator: ContentGenerator,
    /// Static default snapshot unless TRENDS_API_URL is set.
    pub trends: Arc<dyn TrendSource>,
    pub store: Arc<dyn DocumentStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
}
