//! Database repository for machines.
//!
//! Machines are the central entity of the asset registry. Every document,
//! maintenance record, and scheduled maintenance hangs off a machine, and
//! the public QR lookup resolves a machine by its id.

use crate::types::{abbrev_uuid, MachineId, MachineTypeId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::machines::{MachineCreateDBRequest, MachineDBResponse, MachineUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing machines
#[derive(Debug, Clone)]
pub struct MachineFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub machine_type_id: Option<MachineTypeId>,
}

impl MachineFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            machine_type_id: None,
        }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_machine_type(mut self, machine_type_id: MachineTypeId) -> Self {
        self.machine_type_id = Some(machine_type_id);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Machine {
    pub id: MachineId,
    pub machine_type_id: MachineTypeId,
    pub name: String,
    pub serial_number: String,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Machine> for MachineDBResponse {
    fn from(row: Machine) -> Self {
        Self {
            id: row.id,
            machine_type_id: row.machine_type_id,
            name: row.name,
            serial_number: row.serial_number,
            manufacturer: row.manufacturer,
            location: row.location,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct Machines<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Machines<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &MachineFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM machines WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &MachineFilter) {
    if let Some(machine_type_id) = filter.machine_type_id {
        query.push(" AND machine_type_id = ");
        query.push_bind(machine_type_id);
    }
    if let Some(ref search) = filter.search {
        let search_pattern = format!("%{}%", super::escape_like(&search.to_lowercase()));
        query.push(" AND (LOWER(name) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(serial_number) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(COALESCE(manufacturer, '')) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(COALESCE(location, '')) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Machines<'c> {
    type CreateRequest = MachineCreateDBRequest;
    type UpdateRequest = MachineUpdateDBRequest;
    type Response = MachineDBResponse;
    type Id = MachineId;
    type Filter = MachineFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            INSERT INTO machines (id, machine_type_id, name, serial_number, manufacturer, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.machine_type_id)
        .bind(&request.name)
        .bind(&request.serial_number)
        .bind(&request.manufacturer)
        .bind(&request.location)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(MachineDBResponse::from(machine))
    }

    #[instrument(skip(self), fields(machine_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let machine = sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(machine.map(MachineDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(
        &mut self,
        ids: Vec<MachineId>,
    ) -> Result<std::collections::HashMap<MachineId, MachineDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let machines = sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(machines
            .into_iter()
            .map(|m| (m.id, MachineDBResponse::from(m)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM machines WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY name LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let machines = query.build_query_as::<Machine>().fetch_all(&mut *self.db).await?;

        Ok(machines.into_iter().map(MachineDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(machine_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM machines WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(machine_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            UPDATE machines SET
                machine_type_id = COALESCE($2, machine_type_id),
                name = COALESCE($3, name),
                serial_number = COALESCE($4, serial_number),
                manufacturer = COALESCE($5, manufacturer),
                location = COALESCE($6, location),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.machine_type_id)
        .bind(&request.name)
        .bind(&request.serial_number)
        .bind(&request.manufacturer)
        .bind(&request.location)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?
        .ok_or(DbError::NotFound)?;

        Ok(MachineDBResponse::from(machine))
    }
}
