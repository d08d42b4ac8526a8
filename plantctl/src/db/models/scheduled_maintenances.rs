//! Database models for scheduled (planned) maintenance.

use crate::api::models::scheduled_maintenances::{ScheduledMaintenanceCreate, ScheduledMaintenanceUpdate};
use crate::types::{MachineId, ScheduledMaintenanceId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How often a planned maintenance recurs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "maintenance_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

#[derive(Debug, Clone)]
pub struct ScheduledMaintenanceCreateDBRequest {
    pub machine_id: MachineId,
    pub description: String,
    pub due_date: NaiveDate,
    pub frequency: MaintenanceFrequency,
}

impl From<ScheduledMaintenanceCreate> for ScheduledMaintenanceCreateDBRequest {
    fn from(api: ScheduledMaintenanceCreate) -> Self {
        Self {
            machine_id: api.machine_id,
            description: api.description,
            due_date: api.due_date,
            frequency: api.frequency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledMaintenanceUpdateDBRequest {
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub frequency: Option<MaintenanceFrequency>,
}

impl From<ScheduledMaintenanceUpdate> for ScheduledMaintenanceUpdateDBRequest {
    fn from(api: ScheduledMaintenanceUpdate) -> Self {
        Self {
            description: api.description,
            due_date: api.due_date,
            frequency: api.frequency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledMaintenanceDBResponse {
    pub id: ScheduledMaintenanceId,
    pub machine_id: MachineId,
    pub description: String,
    pub due_date: NaiveDate,
    pub frequency: MaintenanceFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
