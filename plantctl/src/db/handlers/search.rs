//! Cross-entity search.
//!
//! Runs the same case-insensitive substring match the individual list
//! endpoints use, across machines, documents, and maintenance records in
//! one call.

use crate::db::{
    errors::Result,
    handlers::{
        documents::{DocumentFilter, Documents},
        machines::{MachineFilter, Machines},
        maintenances::{MaintenanceFilter, Maintenances},
        repository::Repository,
    },
    models::{
        documents::DocumentDBResponse, machines::MachineDBResponse,
        maintenances::MaintenanceDBResponse,
    },
};
use sqlx::PgConnection;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub machines: Vec<MachineDBResponse>,
    pub documents: Vec<DocumentDBResponse>,
    pub maintenances: Vec<MaintenanceDBResponse>,
}

pub struct Search<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Search<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Search machines, documents, and maintenance records. `limit` caps
    /// each entity list independently.
    #[instrument(skip(self, term), fields(limit = limit), err)]
    pub async fn search(&mut self, term: &str, limit: i64) -> Result<SearchResults> {
        let machines = Machines::new(self.db)
            .list(&MachineFilter::new(0, limit).with_search(term.to_string()))
            .await?;

        let documents = Documents::new(self.db)
            .list(&DocumentFilter::new(0, limit).with_search(term.to_string()))
            .await?;

        let maintenances = Maintenances::new(self.db)
            .list(&MaintenanceFilter::new(0, limit).with_search(term.to_string()))
            .await?;

        Ok(SearchResults {
            machines,
            documents,
            maintenances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{categories::Categories, machine_types::MachineTypes};
    use crate::db::models::{
        categories::CategoryCreateDBRequest, documents::DocumentCreateDBRequest,
        machine_types::MachineTypeCreateDBRequest, machines::MachineCreateDBRequest,
        maintenances::MaintenanceCreateDBRequest,
    };
    use chrono::NaiveDate;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_spans_entities(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();

        let category_id = Categories::new(&mut conn)
            .create(&CategoryCreateDBRequest {
                name: "Lathes".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;

        let machine_type_id = MachineTypes::new(&mut conn)
            .create(&MachineTypeCreateDBRequest {
                category_id,
                name: "Turret Lathe".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;

        let machine_id = Machines::new(&mut conn)
            .create(&MachineCreateDBRequest {
                machine_type_id,
                name: "Spindle Master 3000".to_string(),
                serial_number: "SN-001".to_string(),
                manufacturer: None,
                location: None,
                notes: None,
            })
            .await
            .unwrap()
            .id;

        Documents::new(&mut conn)
            .create(&DocumentCreateDBRequest {
                machine_id,
                title: "Spindle alignment guide".to_string(),
                file_name: "alignment.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: 256,
                storage_key: Uuid::new_v4(),
                uploaded_by: None,
            })
            .await
            .unwrap();

        Maintenances::new(&mut conn)
            .create(&MaintenanceCreateDBRequest {
                machine_id,
                description: "Spindle bearing swap".to_string(),
                performed_at: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                performed_by: None,
                notes: None,
            })
            .await
            .unwrap();

        let results = Search::new(&mut conn).search("spindle", 10).await.unwrap();
        assert_eq!(results.machines.len(), 1);
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.maintenances.len(), 1);

        let empty = Search::new(&mut conn).search("nonexistent", 10).await.unwrap();
        assert!(empty.machines.is_empty());
        assert!(empty.documents.is_empty());
        assert!(empty.maintenances.is_empty());
    }
}
