//! API request/response models for scheduled maintenance.

use super::pagination::Pagination;
use crate::db::models::scheduled_maintenances::{
    MaintenanceFrequency, ScheduledMaintenanceDBResponse,
};
use crate::types::{MachineId, ScheduledMaintenanceId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing scheduled maintenance entries
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListScheduledMaintenancesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return entries for this machine
    #[param(value_type = Option<String>, format = "uuid")]
    pub machine_id: Option<MachineId>,

    /// Only return entries due on or before this date
    #[param(value_type = Option<String>, format = Date)]
    pub due_before: Option<NaiveDate>,
}

/// Request body for planning maintenance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduledMaintenanceCreate {
    /// Machine the work is planned for
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// What needs to be done
    #[schema(example = "Quarterly lubrication")]
    pub description: String,
    /// Date the work is next due
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    /// How often the work recurs
    pub frequency: MaintenanceFrequency,
}

/// Request body for rescheduling or amending a planned maintenance. All
/// fields are optional; only provided fields will be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduledMaintenanceUpdate {
    /// New description (null to keep unchanged)
    pub description: Option<String>,
    /// New due date (null to keep unchanged)
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    /// New recurrence (null to keep unchanged)
    pub frequency: Option<MaintenanceFrequency>,
}

/// Full scheduled maintenance entry returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduledMaintenanceResponse {
    /// Unique identifier for the entry
    #[schema(value_type = String, format = "uuid")]
    pub id: ScheduledMaintenanceId,
    /// Machine the work is planned for
    #[schema(value_type = String, format = "uuid")]
    pub machine_id: MachineId,
    /// What needs to be done
    pub description: String,
    /// Date the work is next due
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    /// How often the work recurs
    pub frequency: MaintenanceFrequency,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<ScheduledMaintenanceDBResponse> for ScheduledMaintenanceResponse {
    fn from(db: ScheduledMaintenanceDBResponse) -> Self {
        Self {
            id: db.id,
            machine_id: db.machine_id,
            description: db.description,
            due_date: db.due_date,
            frequency: db.frequency,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
