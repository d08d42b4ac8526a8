//! Database repository for completed maintenance records.

use crate::types::{abbrev_uuid, MachineId, MaintenanceId, UserId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::maintenances::{
        MaintenanceCreateDBRequest, MaintenanceDBResponse, MaintenanceUpdateDBRequest,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing maintenance records
#[derive(Debug, Clone)]
pub struct MaintenanceFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub machine_id: Option<MachineId>,
}

impl MaintenanceFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            machine_id: None,
        }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_machine(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Maintenance {
    pub id: MaintenanceId,
    pub machine_id: MachineId,
    pub description: String,
    pub performed_at: NaiveDate,
    pub performed_by: Option<UserId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Maintenance> for MaintenanceDBResponse {
    fn from(row: Maintenance) -> Self {
        Self {
            id: row.id,
            machine_id: row.machine_id,
            description: row.description,
            performed_at: row.performed_at,
            performed_by: row.performed_by,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct Maintenances<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Maintenances<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &MaintenanceFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM maintenances WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &MaintenanceFilter) {
    if let Some(machine_id) = filter.machine_id {
        query.push(" AND machine_id = ");
        query.push_bind(machine_id);
    }
    if let Some(ref search) = filter.search {
        let search_pattern = format!("%{}%", super::escape_like(&search.to_lowercase()));
        query.push(" AND (LOWER(description) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(COALESCE(notes, '')) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Maintenances<'c> {
    type CreateRequest = MaintenanceCreateDBRequest;
    type UpdateRequest = MaintenanceUpdateDBRequest;
    type Response = MaintenanceDBResponse;
    type Id = MaintenanceId;
    type Filter = MaintenanceFilter;

    #[instrument(skip(self, request), fields(machine_id = %abbrev_uuid(&request.machine_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let maintenance = sqlx::query_as::<_, Maintenance>(
            r#"
            INSERT INTO maintenances (id, machine_id, description, performed_at, performed_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.machine_id)
        .bind(&request.description)
        .bind(request.performed_at)
        .bind(request.performed_by)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(MaintenanceDBResponse::from(maintenance))
    }

    #[instrument(skip(self), fields(maintenance_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let maintenance =
            sqlx::query_as::<_, Maintenance>("SELECT * FROM maintenances WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(maintenance.map(MaintenanceDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(
        &mut self,
        ids: Vec<MaintenanceId>,
    ) -> Result<std::collections::HashMap<MaintenanceId, MaintenanceDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let maintenances =
            sqlx::query_as::<_, Maintenance>("SELECT * FROM maintenances WHERE id = ANY($1)")
                .bind(ids.as_slice())
                .fetch_all(&mut *self.db)
                .await?;

        Ok(maintenances
            .into_iter()
            .map(|m| (m.id, MaintenanceDBResponse::from(m)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM maintenances WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY performed_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let maintenances = query
            .build_query_as::<Maintenance>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(maintenances
            .into_iter()
            .map(MaintenanceDBResponse::from)
            .collect())
    }

    #[instrument(skip(self), fields(maintenance_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM maintenances WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(maintenance_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let maintenance = sqlx::query_as::<_, Maintenance>(
            r#"
            UPDATE maintenances SET
                description = COALESCE($2, description),
                performed_at = COALESCE($3, performed_at),
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.description)
        .bind(request.performed_at)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(MaintenanceDBResponse::from(maintenance))
    }
}
