//! API request/response models for cross-entity search.

use crate::api::models::{
    documents::DocumentResponse, machines::MachineResponse, maintenances::MaintenanceResponse,
};
use crate::db::handlers::search::SearchResults;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_SEARCH_LIMIT: i64 = 10;
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Search term (case-insensitive substring match)
    pub q: String,

    /// Maximum number of results per entity (1-50, default 10)
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

/// Search results grouped by entity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub machines: Vec<MachineResponse>,
    pub documents: Vec<DocumentResponse>,
    pub maintenances: Vec<MaintenanceResponse>,
}

impl From<SearchResults> for SearchResponse {
    fn from(results: SearchResults) -> Self {
        Self {
            machines: results.machines.into_iter().map(Into::into).collect(),
            documents: results.documents.into_iter().map(Into::into).collect(),
            maintenances: results.maintenances.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        let q: SearchQuery = serde_urlencoded::from_str("q=lathe").unwrap();
        assert_eq!(q.limit(), DEFAULT_SEARCH_LIMIT);

        let q: SearchQuery = serde_urlencoded::from_str("q=lathe&limit=500").unwrap();
        assert_eq!(q.limit(), MAX_SEARCH_LIMIT);

        let q: SearchQuery = serde_urlencoded::from_str("q=lathe&limit=0").unwrap();
        assert_eq!(q.limit(), 1);
    }
}
