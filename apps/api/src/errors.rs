use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::export::ExportError;
use crate::generation::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Generation(GenerationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRequest(msg) => AppError::Validation(msg),
            other => AppError::Generation(other),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Generation(e) => {
                let (status, code) = match e {
                    GenerationError::NoProviderConfigured => {
                        (StatusCode::SERVICE_UNAVAILABLE, "NO_PROVIDER_CONFIGURED")
                    }
                    GenerationError::MissingCredential(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "MISSING_CREDENTIAL")
                    }
                    GenerationError::ProviderFailed(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_FAILED"),
                    GenerationError::MalformedOutput(_) => {
                        (StatusCode::BAD_GATEWAY, "MALFORMED_OUTPUT")
                    }
                    GenerationError::NoUsableOutput => (StatusCode::BAD_GATEWAY, "NO_USABLE_OUTPUT"),
                    GenerationError::InvalidRequest(_) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                    }
                };
                tracing::warn!("Generation error ({code}): {e}");
                (status, code, e.to_string())
            }
            AppError::Export(e) => match e {
                ExportError::Timeout => {
                    tracing::warn!("Export error: {e}");
                    (StatusCode::GATEWAY_TIMEOUT, "EXPORT_TIMEOUT", e.to_string())
                }
                ExportError::Render(_) => {
                    tracing::warn!("Export error: {e}");
                    (StatusCode::UNPROCESSABLE_ENTITY, "RENDER_ERROR", e.to_string())
                }
            },
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{ProviderError, ProviderKind, RouterError};

    #[test]
    fn test_generation_errors_distinguish_credentials_from_failures() {
        let (status, code, message) =
            AppError::from(GenerationError::NoProviderConfigured).parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "NO_PROVIDER_CONFIGURED");
        assert!(message.contains("OPENAI_API_KEY"));

        let failed = GenerationError::ProviderFailed(RouterError::Exhausted {
            attempts: 1,
            last: ProviderError::RateLimited {
                provider: ProviderKind::Gemini,
            },
        });
        let (status, code, _) = AppError::from(failed).parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "PROVIDER_FAILED");
    }

    #[test]
    fn test_internal_details_are_masked() {
        let (status, _, message) =
            AppError::Internal(anyhow::anyhow!("secret connection string")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret"));
    }

    #[test]
    fn test_export_timeout_maps_to_gateway_timeout() {
        let response = AppError::from(ExportError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_invalid_generation_request_is_a_validation_error() {
        let err = AppError::from(GenerationError::InvalidRequest(
            "section heading must not be blank".to_string(),
        ));
        assert!(matches!(err, AppError::Validation(_)));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("heading"));
    }

    #[test]
    fn test_render_failure_is_unprocessable() {
        let response =
            AppError::from(ExportError::Render("document has no content".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
