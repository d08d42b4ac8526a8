//! API request/response models for machine types.

use super::pagination::Pagination;
use crate::db::models::machine_types::MachineTypeDBResponse;
use crate::types::{CategoryId, MachineTypeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing machine types
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMachineTypesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return types belonging to this category
    #[param(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,

    /// Search query to filter types by name or description (case-insensitive substring match)
    pub search: Option<String>,
}

/// Request body for creating a new machine type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineTypeCreate {
    /// Category the type belongs to
    #[schema(value_type = String, format = "uuid")]
    pub category_id: CategoryId,
    /// Display name for the type (unique within its category)
    #[schema(example = "Turret Lathe")]
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Request body for updating an existing machine type. All fields are
/// optional; only provided fields will be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineTypeUpdate {
    /// Move the type to another category (null to keep unchanged)
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    /// New display name (null to keep unchanged)
    pub name: Option<String>,
    /// New description (null to keep unchanged)
    pub description: Option<String>,
}

/// Full machine type details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineTypeResponse {
    /// Unique identifier for the type
    #[schema(value_type = String, format = "uuid")]
    pub id: MachineTypeId,
    /// Category the type belongs to
    #[schema(value_type = String, format = "uuid")]
    pub category_id: CategoryId,
    /// Display name for the type
    pub name: String,
    /// Description of the type
    pub description: Option<String>,
    /// When the type was created
    pub created_at: DateTime<Utc>,
    /// When the type was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<MachineTypeDBResponse> for MachineTypeResponse {
    fn from(db: MachineTypeDBResponse) -> Self {
        Self {
            id: db.id,
            category_id: db.category_id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
