pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::documents::handlers as documents;
use crate::generation::handlers as generation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Providers and trends
        .route("/api/v1/providers", get(generation::handle_list_providers))
        .route("/api/v1/trends", get(generation::handle_get_trends))
        // Generation
        .route("/api/v1/generate", post(generation::handle_generate))
        .route(
            "/api/v1/generate/titles",
            post(generation::handle_generate_titles),
        )
        .route(
            "/api/v1/generate/introduction",
            post(generation::handle_generate_introduction),
        )
        .route(
            "/api/v1/generate/section",
            post(generation::handle_generate_section),
        )
        .route(
            "/api/v1/proposals",
            post(generation::handle_generate_proposals),
        )
        // Documents
        .route("/api/v1/documents", post(documents::handle_save_document))
        .route(
            "/api/v1/documents/export",
            post(documents::handle_export_document),
        )
        .route("/api/v1/documents/:id", get(documents::handle_get_document))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::documents::export::MarkdownRenderer;
    use crate::documents::PgDocumentStore;
    use crate::generation::generator::ContentGenerator;
    use crate::llm_client::ProviderRouter;
    use crate::trends::StaticTrendSource;

    /// App with no providers; the pool is lazy and never connects.
    fn app() -> Router {
        let router = ProviderRouter::new(vec![]);
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pressroom_test")
            .unwrap();
        build_router(AppState {
            generator: ContentGenerator::new(router.clone()),
            router,
            trends: Arc::new(StaticTrendSource),
            store: Arc::new(PgDocumentStore::new(pool)),
            renderer: Arc::new(MarkdownRenderer::new()),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "pressroom-api");
    }

    #[tokio::test]
    async fn test_providers_lists_nothing_configured() {
        let response = app()
            .oneshot(Request::get("/api/v1/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["anyConfigured"], false);
        assert_eq!(body["providers"], json!([]));
    }

    #[tokio::test]
    async fn test_titles_without_provider_returns_actionable_503() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/generate/titles",
                json!({"document": {"title": "新製品"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NO_PROVIDER_CONFIGURED");
    }

    #[tokio::test]
    async fn test_introduction_falls_back_to_template() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/generate/introduction",
                json!({"document": {"title": "スマート傘", "contact": {"companyName": "株式会社テスト"}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["source"]["kind"], "template");
        assert!(body["text"].as_str().unwrap().starts_with("株式会社テスト"));
    }

    #[tokio::test]
    async fn test_proposals_use_static_trends() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/proposals",
                json!({"input": {"productServiceName": "スマート傘", "industry": "IT"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(!body["proposals"].as_array().unwrap().is_empty());
        assert_eq!(body["trends"]["keywords"][0], "生成AI");
    }

    #[tokio::test]
    async fn test_export_returns_markdown_attachment() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/documents/export",
                json!({"title": "Smart Umbrella"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"smart-umbrella.md\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with("# Smart Umbrella".as_bytes()));
    }
}
