//! API request/response models for machine categories.

use super::pagination::Pagination;
use crate::db::models::categories::CategoryDBResponse;
use crate::types::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing categories
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Search query to filter categories by name or description (case-insensitive substring match)
    pub search: Option<String>,
}

/// Request body for creating a new category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCreate {
    /// Display name for the category (must be unique)
    #[schema(example = "Lathes")]
    pub name: String,
    /// Optional description of what belongs in the category
    #[schema(example = "Manual and CNC turning machines")]
    pub description: Option<String>,
}

/// Request body for updating an existing category. All fields are optional;
/// only provided fields will be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryUpdate {
    /// New display name (null to keep unchanged)
    pub name: Option<String>,
    /// New description (null to keep unchanged)
    pub description: Option<String>,
}

/// Full category details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    /// Unique identifier for the category
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    /// Display name for the category
    pub name: String,
    /// Description of what belongs in the category
    pub description: Option<String>,
    /// When the category was created
    pub created_at: DateTime<Utc>,
    /// When the category was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(db: CategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
