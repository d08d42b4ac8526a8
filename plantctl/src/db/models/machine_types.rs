//! Database models for machine types.

use crate::api::models::machine_types::{MachineTypeCreate, MachineTypeUpdate};
use crate::types::{CategoryId, MachineTypeId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MachineTypeCreateDBRequest {
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl From<MachineTypeCreate> for MachineTypeCreateDBRequest {
    fn from(api: MachineTypeCreate) -> Self {
        Self {
            category_id: api.category_id,
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachineTypeUpdateDBRequest {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<MachineTypeUpdate> for MachineTypeUpdateDBRequest {
    fn from(api: MachineTypeUpdate) -> Self {
        Self {
            category_id: api.category_id,
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachineTypeDBResponse {
    pub id: MachineTypeId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
