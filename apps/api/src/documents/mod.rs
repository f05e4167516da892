// Persistence and export collaborators for finished documents.
// Neither is consulted during generation: the store is a pass-through sink
// and the renderer only consumes finalized snapshots.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::{DocumentRow, DocumentSnapshot, StoredDocument};

pub mod export;
pub mod handlers;

/// Save/load of document snapshots.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new snapshot, or replaces the one stored under `id`.
    async fn save(&self, id: Option<Uuid>, document: &DocumentSnapshot) -> Result<Uuid, AppError>;

    async fn load(&self, id: Uuid) -> Result<Option<StoredDocument>, AppError>;
}

/// Snapshots stored whole as JSONB in the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn save(&self, id: Option<Uuid>, document: &DocumentSnapshot) -> Result<Uuid, AppError> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        sqlx::query(
            r#"
            INSERT INTO documents (id, body)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(Json(document))
        .execute(&self.pool)
        .await?;

        info!("Saved document {id}");
        Ok(id)
    }

    async fn load(&self, id: Uuid) -> Result<Option<StoredDocument>, AppError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, body, created_at, updated_at FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredDocument::from))
    }
}
