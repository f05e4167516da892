use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::documents::export::{export_document, Artifact};
use crate::errors::AppError;
use crate::models::document::{DocumentSnapshot, StoredDocument};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocumentRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub document: DocumentSnapshot,
}

#[derive(Serialize)]
pub struct SaveDocumentResponse {
    pub id: Uuid,
}

/// POST /api/v1/documents
pub async fn handle_save_document(
    State(state): State<AppState>,
    Json(req): Json<SaveDocumentRequest>,
) -> Result<(StatusCode, Json<SaveDocumentResponse>), AppError> {
    let id = state.store.save(req.id, &req.document).await?;
    Ok((StatusCode::CREATED, Json(SaveDocumentResponse { id })))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredDocument>, AppError> {
    let stored = state
        .store
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    Ok(Json(stored))
}

/// POST /api/v1/documents/export
pub async fn handle_export_document(
    State(state): State<AppState>,
    Json(document): Json<DocumentSnapshot>,
) -> Result<Artifact, AppError> {
    let artifact = export_document(state.renderer.as_ref(), &document).await?;
    Ok(artifact)
}
