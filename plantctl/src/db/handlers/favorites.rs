//! Database repository for per-user favorite documents.
//!
//! This is a plain join table, so it does not implement the generic
//! [`Repository`](crate::db::handlers::repository::Repository) trait.

use crate::types::{abbrev_uuid, DocumentId, UserId};
use crate::db::{
    errors::{DbError, Result},
    models::documents::DocumentDBResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct FavoriteDocument {
    pub id: DocumentId,
    pub machine_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: Uuid,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FavoriteDocument> for DocumentDBResponse {
    fn from(row: FavoriteDocument) -> Self {
        Self {
            id: row.id,
            machine_id: row.machine_id,
            title: row.title,
            file_name: row.file_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            storage_key: row.storage_key,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct Favorites<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Favorites<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Mark a document as a favorite. Returns false when it already was one.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), document_id = %abbrev_uuid(&document_id)), err)]
    pub async fn add(&mut self, user_id: UserId, document_id: DocumentId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, document_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(document_id)
        .execute(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a favorite. Returns false when it was not favorited.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), document_id = %abbrev_uuid(&document_id)), err)]
    pub async fn remove(&mut self, user_id: UserId, document_id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND document_id = $2")
            .bind(user_id)
            .bind(document_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's favorite documents, most recently favorited first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(
        &mut self,
        user_id: UserId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<DocumentDBResponse>> {
        let documents = sqlx::query_as::<_, FavoriteDocument>(
            r#"
            SELECT d.*
            FROM favorites f
            JOIN documents d ON d.id = f.document_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(documents.into_iter().map(DocumentDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
