//! Database models for machine categories.

use crate::api::models::categories::{CategoryCreate, CategoryUpdate};
use crate::types::CategoryId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryCreate> for CategoryCreateDBRequest {
    fn from(api: CategoryCreate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<CategoryUpdate> for CategoryUpdateDBRequest {
    fn from(api: CategoryUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
