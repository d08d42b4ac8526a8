//! Role-based permission checks and typed route guards.
//!
//! Handlers declare their requirement in the signature:
//!
//! ```ignore
//! async fn create_machine(
//!     current_user: RequiresPermission<resource::Machines, operation::CreateAll>,
//!     ...
//! ) -> Result<...> { ... }
//! ```
//!
//! Extraction fails with 401 when no user is authenticated and 403 when the
//! user lacks the permission.

use crate::{
    api::models::users::CurrentUser,
    errors::Error,
    types::{Operation, Permission, Resource, UserId},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;
use std::ops::Deref;

/// Check whether a user holds a permission.
///
/// Admins hold everything. Standard users can read all resources and act on
/// their own documents, maintenances, and favorites.
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    if user.is_admin {
        return true;
    }

    match operation {
        Operation::ReadAll | Operation::ReadOwn => true,
        Operation::CreateOwn => matches!(resource, Resource::Documents | Resource::Maintenances | Resource::Favorites),
        Operation::DeleteOwn => matches!(resource, Resource::Favorites),
        Operation::UpdateOwn => false,
        Operation::CreateAll | Operation::UpdateAll | Operation::DeleteAll => false,
    }
}

pub fn can_read_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::ReadAll)
}

pub fn can_read_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    user.id == owner && has_permission(user, resource, Operation::ReadOwn)
}

pub fn can_delete_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    user.id == owner && has_permission(user, resource, Operation::DeleteOwn)
}

pub trait ResourceMarker {
    const RESOURCE: Resource;
}

pub trait OperationMarker {
    const OPERATION: Operation;
}

macro_rules! resource_markers {
    ($($name:ident => $variant:ident),* $(,)?) => {
        pub mod resource {
            $(
                pub struct $name;
                impl super::ResourceMarker for $name {
                    const RESOURCE: super::Resource = super::Resource::$variant;
                }
            )*
        }
    };
}

macro_rules! operation_markers {
    ($($name:ident),* $(,)?) => {
        pub mod operation {
            $(
                pub struct $name;
                impl super::OperationMarker for $name {
                    const OPERATION: super::Operation = super::Operation::$name;
                }
            )*
        }
    };
}

resource_markers! {
    Users => Users,
    Categories => Categories,
    MachineTypes => MachineTypes,
    Machines => Machines,
    Documents => Documents,
    Maintenances => Maintenances,
    ScheduledMaintenances => ScheduledMaintenances,
    Favorites => Favorites,
}

operation_markers! {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

/// Extractor that authenticates the caller and enforces one permission.
///
/// Derefs to [`CurrentUser`] so handlers can use the user directly.
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: ResourceMarker + Send,
    O: OperationMarker + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !has_permission(&user, R::RESOURCE, O::OPERATION) {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(R::RESOURCE, O::OPERATION),
                action: O::OPERATION,
                resource: R::RESOURCE.to_string(),
            });
        }

        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
