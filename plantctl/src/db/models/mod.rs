//! Database record models matching table schemas.
//!
//! These structs are what repositories accept and return. They are kept
//! separate from the API models in [`crate::api::models`] so the storage
//! representation and the public contract can evolve independently;
//! repositories return `*DBResponse` values and the API layer converts
//! them with `From` impls.

pub mod categories;
pub mod documents;
pub mod machine_types;
pub mod machines;
pub mod maintenances;
pub mod scheduled_maintenances;
pub mod users;
