//! API request/response models for documents.

use super::pagination::Pagination;
use crate::db::models::documents::DocumentDBResponse;
use crate::types::{DocumentId, MachineId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing documents
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDocumentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return documents attached to this machine
    #[param(value_type = Option<String>, format = "uuid")]
    pub machine_id: Option<MachineId>,

    /// Search query matching title or file name (case-insensitive substring match)
    pub search: Option<String>,
}

/// Multipart form schema for uploading a document. Sent as
/// `multipart/form-data` with `machine_id` and `title` as text fields and
/// `file` carrying the content.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    /// Machine the document is attached to
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// Human-readable title
    pub title: String,
    /// The file content
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Request body for updating document metadata. All fields are optional;
/// only provided fields will be updated. Content is immutable, re-upload to
/// replace it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentUpdate {
    /// Reattach the document to another machine (null to keep unchanged)
    #[schema(value_type = Option<String>, format = "uuid")]
    pub machine_id: Option<MachineId>,
    /// New title (null to keep unchanged)
    pub title: Option<String>,
}

/// Document metadata returned by the API. Content is served separately from
/// the `/documents/{id}/content` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    /// Unique identifier for the document
    #[schema(value_type = String, format = "uuid")]
    pub id: DocumentId,
    /// Machine the document is attached to
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// Human-readable title
    pub title: String,
    /// Original file name at upload time
    pub file_name: String,
    /// MIME type of the content
    pub content_type: String,
    /// Content size in bytes
    pub size_bytes: i64,
    /// User who uploaded the document, if still present
    #[schema(value_type = Option<String>, format = "uuid")]
    pub uploaded_by: Option<UserId>,
    /// When the document was uploaded
    pub created_at: DateTime<Utc>,
    /// When the metadata was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentDBResponse> for DocumentResponse {
    fn from(db: DocumentDBResponse) -> Self {
        Self {
            id: db.id,
            machine_id: db.machine_id,
            title: db.title,
            file_name: db.file_name,
            content_type: db.content_type,
            size_bytes: db.size_bytes,
            uploaded_by: db.uploaded_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
