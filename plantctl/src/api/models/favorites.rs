//! API request/response models for favorite documents.

use crate::types::DocumentId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for marking a document as a favorite.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteCreate {
    /// Document to favorite
    #[schema(value_type = String, format = "uuid")]
    pub document_id: DocumentId,
}

/// Response for favorite add/remove operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponse {
    /// Document the operation applied to
    #[schema(value_type = String, format = "uuid")]
    pub document_id: DocumentId,
    /// Whether the call changed anything (false when the favorite already
    /// existed, or was already gone)
    pub changed: bool,
}
