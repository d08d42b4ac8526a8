//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//! - Uses the connection's transaction for ACID guarantees
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and authentication
//! - [`Categories`]: Top-level machine categories
//! - [`MachineTypes`]: Machine types within a category
//! - [`Machines`]: The machine registry itself
//! - [`Documents`]: Document metadata (content lives in [`document_storage`])
//! - [`Maintenances`]: Completed maintenance records
//! - [`ScheduledMaintenances`]: Planned maintenance entries
//! - [`Favorites`]: Per-user favorite documents (join table, custom API)
//! - [`search`]: Cross-entity substring search
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use plantctl::db::handlers::{Machines, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     // Start a transaction
//!     let mut tx = pool.begin().await?;
//!
//!     // Create repository from transaction
//!     let mut repo = Machines::new(&mut tx);
//!
//!     // Perform operations
//!     let machines = repo.list(&filter).await?;
//!
//!     // Commit or rollback
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod document_storage;
pub mod documents;
pub mod favorites;
pub mod machine_types;
pub mod machines;
pub mod maintenances;
pub mod repository;
pub mod scheduled_maintenances;
pub mod search;
pub mod users;

/// Escape `LIKE` metacharacters so a search term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub use categories::Categories;
pub use document_storage::{create_document_storage, DocumentStorage};
pub use documents::Documents;
pub use favorites::Favorites;
pub use machine_types::MachineTypes;
pub use machines::Machines;
pub use maintenances::Maintenances;
pub use repository::Repository;
pub use scheduled_maintenances::ScheduledMaintenances;
pub use users::Users;
