//! Database repository for scheduled (upcoming) maintenance entries.

use crate::types::{abbrev_uuid, MachineId, ScheduledMaintenanceId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::scheduled_maintenances::{
        ScheduledMaintenanceCreateDBRequest, ScheduledMaintenanceDBResponse,
        ScheduledMaintenanceUpdateDBRequest,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::db::models::scheduled_maintenances::MaintenanceFrequency;

/// Filter for listing scheduled maintenance entries
#[derive(Debug, Clone)]
pub struct ScheduledMaintenanceFilter {
    pub skip: i64,
    pub limit: i64,
    pub machine_id: Option<MachineId>,
    pub due_before: Option<NaiveDate>,
}

impl ScheduledMaintenanceFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            machine_id: None,
            due_before: None,
        }
    }

    pub fn with_machine(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn with_due_before(mut self, due_before: NaiveDate) -> Self {
        self.due_before = Some(due_before);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct ScheduledMaintenance {
    pub id: ScheduledMaintenanceId,
    pub machine_id: MachineId,
    pub description: String,
    pub due_date: NaiveDate,
    pub frequency: MaintenanceFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScheduledMaintenance> for ScheduledMaintenanceDBResponse {
    fn from(row: ScheduledMaintenance) -> Self {
        Self {
            id: row.id,
            machine_id: row.machine_id,
            description: row.description,
            due_date: row.due_date,
            frequency: row.frequency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct ScheduledMaintenances<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ScheduledMaintenances<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ScheduledMaintenanceFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM scheduled_maintenances WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_filters(
    query: &mut QueryBuilder<'_, sqlx::Postgres>,
    filter: &ScheduledMaintenanceFilter,
) {
    if let Some(machine_id) = filter.machine_id {
        query.push(" AND machine_id = ");
        query.push_bind(machine_id);
    }
    if let Some(due_before) = filter.due_before {
        query.push(" AND due_date <= ");
        query.push_bind(due_before);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ScheduledMaintenances<'c> {
    type CreateRequest = ScheduledMaintenanceCreateDBRequest;
    type UpdateRequest = ScheduledMaintenanceUpdateDBRequest;
    type Response = ScheduledMaintenanceDBResponse;
    type Id = ScheduledMaintenanceId;
    type Filter = ScheduledMaintenanceFilter;

    #[instrument(skip(self, request), fields(machine_id = %abbrev_uuid(&request.machine_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let scheduled = sqlx::query_as::<_, ScheduledMaintenance>(
            r#"
            INSERT INTO scheduled_maintenances (id, machine_id, description, due_date, frequency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.machine_id)
        .bind(&request.description)
        .bind(request.due_date)
        .bind(request.frequency)
        .fetch_one(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(ScheduledMaintenanceDBResponse::from(scheduled))
    }

    #[instrument(skip(self), fields(scheduled_maintenance_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let scheduled = sqlx::query_as::<_, ScheduledMaintenance>(
            "SELECT * FROM scheduled_maintenances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(scheduled.map(ScheduledMaintenanceDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(
        &mut self,
        ids: Vec<ScheduledMaintenanceId>,
    ) -> Result<std::collections::HashMap<ScheduledMaintenanceId, ScheduledMaintenanceDBResponse>>
    {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let scheduled = sqlx::query_as::<_, ScheduledMaintenance>(
            "SELECT * FROM scheduled_maintenances WHERE id = ANY($1)",
        )
        .bind(ids.as_slice())
        .fetch_all(&mut *self.db)
        .await?;

        Ok(scheduled
            .into_iter()
            .map(|s| (s.id, ScheduledMaintenanceDBResponse::from(s)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM scheduled_maintenances WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY due_date LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let scheduled = query
            .build_query_as::<ScheduledMaintenance>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(scheduled
            .into_iter()
            .map(ScheduledMaintenanceDBResponse::from)
            .collect())
    }

    #[instrument(skip(self), fields(scheduled_maintenance_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scheduled_maintenances WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(scheduled_maintenance_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let scheduled = sqlx::query_as::<_, ScheduledMaintenance>(
            r#"
            UPDATE scheduled_maintenances SET
                description = COALESCE($2, description),
                due_date = COALESCE($3, due_date),
                frequency = COALESCE($4, frequency),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.description)
        .bind(request.due_date)
        .bind(request.frequency)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ScheduledMaintenanceDBResponse::from(scheduled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{
        categories::Categories, machine_types::MachineTypes, machines::Machines,
    };
    use crate::db::models::{
        categories::CategoryCreateDBRequest, machine_types::MachineTypeCreateDBRequest,
        machines::MachineCreateDBRequest,
    };
    use sqlx::PgPool;

    async fn create_machine(conn: &mut PgConnection) -> MachineId {
        let category_id = Categories::new(conn)
            .create(&CategoryCreateDBRequest {
                name: "Lathes".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;

        let machine_type_id = MachineTypes::new(conn)
            .create(&MachineTypeCreateDBRequest {
                category_id,
                name: "Turret Lathe".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;

        Machines::new(conn)
            .create(&MachineCreateDBRequest {
                machine_type_id,
                name: "Lathe 1".to_string(),
                serial_number: "SN-001".to_string(),
                manufacturer: None,
                location: None,
                notes: None,
            })
            .await
            .unwrap()
            .id
    }

    fn create_request(
        machine_id: MachineId,
        due_date: NaiveDate,
    ) -> ScheduledMaintenanceCreateDBRequest {
        ScheduledMaintenanceCreateDBRequest {
            machine_id,
            description: "Quarterly lubrication".to_string(),
            due_date,
            frequency: MaintenanceFrequency::Quarterly,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_scheduled_maintenance(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;
        let due = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let mut repo = ScheduledMaintenances::new(&mut conn);
        let created = repo.create(&create_request(machine_id, due)).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.due_date, due);
        assert_eq!(fetched.frequency, MaintenanceFrequency::Quarterly);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_machine_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ScheduledMaintenances::new(&mut conn);

        let due = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err = repo.create(&create_request(Uuid::new_v4(), due)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_due_before(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        let mut repo = ScheduledMaintenances::new(&mut conn);
        repo.create(&create_request(
            machine_id,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        ))
        .await
        .unwrap();
        repo.create(&create_request(
            machine_id,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        ))
        .await
        .unwrap();

        let filter = ScheduledMaintenanceFilter::new(0, 10)
            .with_due_before(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let results = repo.list(&filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].due_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_reschedules_due_date(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        let mut repo = ScheduledMaintenances::new(&mut conn);
        let created = repo
            .create(&create_request(
                machine_id,
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            ))
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                &ScheduledMaintenanceUpdateDBRequest {
                    description: None,
                    due_date: Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
                    frequency: Some(MaintenanceFrequency::Monthly),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(updated.frequency, MaintenanceFrequency::Monthly);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_machine_delete_blocked_by_schedule(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        ScheduledMaintenances::new(&mut conn)
            .create(&create_request(
                machine_id,
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            ))
            .await
            .unwrap();

        let err = Machines::new(&mut conn).delete(machine_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
