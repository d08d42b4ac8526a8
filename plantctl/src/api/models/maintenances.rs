//! API request/response models for maintenance records.

use super::pagination::Pagination;
use crate::db::models::maintenances::MaintenanceDBResponse;
use crate::types::{MachineId, MaintenanceId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing maintenance records
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMaintenancesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return records for this machine
    #[param(value_type = Option<String>, format = "uuid")]
    pub machine_id: Option<MachineId>,

    /// Search query matching description or notes (case-insensitive substring match)
    pub search: Option<String>,
}

/// Request body for recording completed maintenance. The performing user is
/// taken from the session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceCreate {
    /// Machine the work was performed on
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// What was done
    #[schema(example = "Spindle bearing swap")]
    pub description: String,
    /// Date the work was performed
    #[schema(value_type = String, format = Date)]
    pub performed_at: NaiveDate,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Request body for correcting a maintenance record. All fields are optional;
/// only provided fields will be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceUpdate {
    /// Corrected description (null to keep unchanged)
    pub description: Option<String>,
    /// Corrected date (null to keep unchanged)
    #[schema(value_type = Option<String>, format = Date)]
    pub performed_at: Option<NaiveDate>,
    /// Corrected notes (null to keep unchanged)
    pub notes: Option<String>,
}

/// Full maintenance record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceResponse {
    /// Unique identifier for the record
    #[schema(value_type = String, format = "uuid")]
    pub id: MaintenanceId,
    /// Machine the work was performed on
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// What was done
    pub description: String,
    /// Date the work was performed
    #[schema(value_type = String, format = Date)]
    pub performed_at: NaiveDate,
    /// User who performed the work, if still present
    #[schema(value_type = Option<String>, format = "uuid")]
    pub performed_by: Option<UserId>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<MaintenanceDBResponse> for MaintenanceResponse {
    fn from(db: MaintenanceDBResponse) -> Self {
        Self {
            id: db.id,
            machine_id: db.machine_id,
            description: db.description,
            performed_at: db.performed_at,
            performed_by: db.performed_by,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
