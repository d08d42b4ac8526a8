//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Models use serde for deserialization and validation
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//! - **Type Safety**: Strong typing with newtype wrappers for IDs
//!
//! # Model Categories
//!
//! ## Resource Models
//!
//! - [`users`]: User profiles and roles
//! - [`categories`]: Machine categories
//! - [`machine_types`]: Machine types within a category
//! - [`machines`]: The machine registry (including the public QR lookup shape)
//! - [`documents`]: Document metadata and upload forms
//! - [`maintenances`]: Completed maintenance records
//! - [`scheduled_maintenances`]: Planned maintenance
//! - [`favorites`]: Per-user favorite documents
//! - [`search`]: Cross-entity search
//!
//! ## Authentication Models
//!
//! - [`auth`]: Login, registration, and logout payloads

pub mod auth;
pub mod categories;
pub mod documents;
pub mod favorites;
pub mod machine_types;
pub mod machines;
pub mod maintenances;
pub mod pagination;
pub mod scheduled_maintenances;
pub mod search;
pub mod users;
