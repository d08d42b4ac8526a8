//! Shared identifier aliases and the access-control vocabulary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;
pub type CategoryId = Uuid;
pub type MachineTypeId = Uuid;
pub type MachineId = Uuid;
pub type DocumentId = Uuid;
pub type MaintenanceId = Uuid;
pub type ScheduledMaintenanceId = Uuid;

/// First eight hex chars of a UUID, for log fields.
pub fn abbrev_uuid(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Operations a user may perform on a resource. The `All`/`Own` split
/// distinguishes acting on any record from acting on records the user
/// created (or, for favorites, records keyed to the user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::CreateAll | Operation::CreateOwn => "create",
            Operation::ReadAll | Operation::ReadOwn => "read",
            Operation::UpdateAll | Operation::UpdateOwn => "update",
            Operation::DeleteAll | Operation::DeleteOwn => "delete",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Resource {
    Users,
    Categories,
    MachineTypes,
    Machines,
    Documents,
    Maintenances,
    ScheduledMaintenances,
    Favorites,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resource::Users => "users",
            Resource::Categories => "categories",
            Resource::MachineTypes => "machine types",
            Resource::Machines => "machines",
            Resource::Documents => "documents",
            Resource::Maintenances => "maintenances",
            Resource::ScheduledMaintenances => "scheduled maintenances",
            Resource::Favorites => "favorites",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    Allow(Resource, Operation),
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Allow(resource, operation) => write!(f, "{operation} {resource}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbrev_uuid_is_eight_chars() {
        let id = Uuid::new_v4();
        assert_eq!(abbrev_uuid(&id).len(), 8);
        assert!(id.simple().to_string().starts_with(&abbrev_uuid(&id)));
    }

    #[test]
    fn permission_display_collapses_all_own() {
        let p = Permission::Allow(Resource::Machines, Operation::UpdateAll);
        assert_eq!(p.to_string(), "update machines");
        let p = Permission::Allow(Resource::Favorites, Operation::DeleteOwn);
        assert_eq!(p.to_string(), "delete favorites");
    }
}
