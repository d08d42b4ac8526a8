//! HTTP request handlers.
//!
//! Handlers declare their access requirement in the signature with
//! [`crate::auth::permissions::RequiresPermission`], pull a connection
//! from the pool, and delegate to the repositories in
//! [`crate::db::handlers`]. Request and response shapes live in
//! [`crate::api::models`].

pub mod auth;
pub mod categories;
pub mod documents;
pub mod favorites;
pub mod machine_types;
pub mod machines;
pub mod maintenances;
pub mod scheduled_maintenances;
pub mod search;
pub mod users;
