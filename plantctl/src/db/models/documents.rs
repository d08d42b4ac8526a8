//! Database models for machine documents.
//!
//! Document rows hold metadata only; content lives behind the
//! [`crate::db::handlers::document_storage::DocumentStorage`] backend,
//! addressed by `storage_key`.

use crate::api::models::documents::DocumentUpdate;
use crate::types::{DocumentId, MachineId, UserId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DocumentCreateDBRequest {
    pub machine_id: MachineId,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: Uuid,
    pub uploaded_by: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct DocumentUpdateDBRequest {
    pub machine_id: Option<MachineId>,
    pub title: Option<String>,
}

impl From<DocumentUpdate> for DocumentUpdateDBRequest {
    fn from(api: DocumentUpdate) -> Self {
        Self {
            machine_id: api.machine_id,
            title: api.title,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentDBResponse {
    pub id: DocumentId,
    pub machine_id: MachineId,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: Uuid,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
