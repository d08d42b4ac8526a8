//! API request/response models for machines.

use super::pagination::Pagination;
use crate::db::models::machines::MachineDBResponse;
use crate::types::{MachineId, MachineTypeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing machines
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMachinesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return machines of this type
    #[param(value_type = Option<String>, format = "uuid")]
    pub machine_type_id: Option<MachineTypeId>,

    /// Search query matching name, serial number, manufacturer, or location
    /// (case-insensitive substring match)
    pub search: Option<String>,
}

/// Request body for registering a new machine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineCreate {
    /// Type of the machine
    #[schema(value_type = String, format = "uuid")]
    pub machine_type_id: MachineTypeId,
    /// Display name for the machine
    #[schema(example = "Lathe 1")]
    pub name: String,
    /// Manufacturer serial number (must be unique)
    #[schema(example = "SN-0042")]
    pub serial_number: String,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Physical location on the floor
    #[schema(example = "Hall B, bay 3")]
    pub location: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Request body for updating an existing machine. All fields are optional;
/// only provided fields will be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineUpdate {
    /// Move the machine to another type (null to keep unchanged)
    #[schema(value_type = Option<String>, format = "uuid")]
    pub machine_type_id: Option<MachineTypeId>,
    /// New display name (null to keep unchanged)
    pub name: Option<String>,
    /// New serial number (null to keep unchanged)
    pub serial_number: Option<String>,
    /// New manufacturer (null to keep unchanged)
    pub manufacturer: Option<String>,
    /// New location (null to keep unchanged)
    pub location: Option<String>,
    /// New notes (null to keep unchanged)
    pub notes: Option<String>,
}

/// Full machine details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachineResponse {
    /// Unique identifier for the machine
    #[schema(value_type = String, format = "uuid")]
    pub id: MachineId,
    /// Type of the machine
    #[schema(value_type = String, format = "uuid")]
    pub machine_type_id: MachineTypeId,
    /// Display name for the machine
    pub name: String,
    /// Manufacturer serial number
    pub serial_number: String,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Physical location on the floor
    pub location: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the machine was registered
    pub created_at: DateTime<Utc>,
    /// When the machine was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<MachineDBResponse> for MachineResponse {
    fn from(db: MachineDBResponse) -> Self {
        Self {
            id: db.id,
            machine_type_id: db.machine_type_id,
            name: db.name,
            serial_number: db.serial_number,
            manufacturer: db.manufacturer,
            location: db.location,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Reduced machine shape served on the unauthenticated QR lookup endpoint.
/// Notes are internal and deliberately left out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MachinePublicResponse {
    /// Unique identifier for the machine
    #[schema(value_type = String, format = "uuid")]
    pub id: MachineId,
    /// Display name for the machine
    pub name: String,
    /// Manufacturer serial number
    pub serial_number: String,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Physical location on the floor
    pub location: Option<String>,
}

impl From<MachineDBResponse> for MachinePublicResponse {
    fn from(db: MachineDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            serial_number: db.serial_number,
            manufacturer: db.manufacturer,
            location: db.location,
        }
    }
}
