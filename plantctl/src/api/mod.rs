//! HTTP API surface.
//!
//! - [`handlers`]: Route handlers, one module per resource
//! - [`models`]: Request and response types with their OpenAPI schemas

pub mod handlers;
pub mod models;
