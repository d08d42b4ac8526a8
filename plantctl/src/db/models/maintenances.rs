//! Database models for maintenance records.

use crate::api::models::maintenances::MaintenanceUpdate;
use crate::types::{MachineId, MaintenanceId, UserId};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct MaintenanceCreateDBRequest {
    pub machine_id: MachineId,
    pub description: String,
    pub performed_at: NaiveDate,
    pub performed_by: Option<UserId>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MaintenanceUpdateDBRequest {
    pub description: Option<String>,
    pub performed_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl From<MaintenanceUpdate> for MaintenanceUpdateDBRequest {
    fn from(api: MaintenanceUpdate) -> Self {
        Self {
            description: api.description,
            performed_at: api.performed_at,
            notes: api.notes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceDBResponse {
    pub id: MaintenanceId,
    pub machine_id: MachineId,
    pub description: String,
    pub performed_at: NaiveDate,
    pub performed_by: Option<UserId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
