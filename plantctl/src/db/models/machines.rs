//! Database models for machines.

use crate::api::models::machines::{MachineCreate, MachineUpdate};
use crate::types::{MachineId, MachineTypeId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MachineCreateDBRequest {
    pub machine_type_id: MachineTypeId,
    pub name: String,
    pub serial_number: String,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl From<MachineCreate> for MachineCreateDBRequest {
    fn from(api: MachineCreate) -> Self {
        Self {
            machine_type_id: api.machine_type_id,
            name: api.name,
            serial_number: api.serial_number,
            manufacturer: api.manufacturer,
            location: api.location,
            notes: api.notes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachineUpdateDBRequest {
    pub machine_type_id: Option<MachineTypeId>,
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl From<MachineUpdate> for MachineUpdateDBRequest {
    fn from(api: MachineUpdate) -> Self {
        Self {
            machine_type_id: api.machine_type_id,
            name: api.name,
            serial_number: api.serial_number,
            manufacturer: api.manufacturer,
            location: api.location,
            notes: api.notes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachineDBResponse {
    pub id: MachineId,
    pub machine_type_id: MachineTypeId,
    pub name: String,
    pub serial_number: String,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
