//! Database repository for machine types.

use crate::types::{abbrev_uuid, CategoryId, MachineTypeId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::machine_types::{
        MachineTypeCreateDBRequest, MachineTypeDBResponse, MachineTypeUpdateDBRequest,
    },
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing machine types
#[derive(Debug, Clone)]
pub struct MachineTypeFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl MachineTypeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            category_id: None,
        }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct MachineType {
    pub id: MachineTypeId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MachineType> for MachineTypeDBResponse {
    fn from(row: MachineType) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct MachineTypes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> MachineTypes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &MachineTypeFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM machine_types WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &MachineTypeFilter) {
    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ");
        query.push_bind(category_id);
    }
    if let Some(ref search) = filter.search {
        let search_pattern = format!("%{}%", super::escape_like(&search.to_lowercase()));
        query.push(" AND (LOWER(name) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(COALESCE(description, '')) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MachineTypes<'c> {
    type CreateRequest = MachineTypeCreateDBRequest;
    type UpdateRequest = MachineTypeUpdateDBRequest;
    type Response = MachineTypeDBResponse;
    type Id = MachineTypeId;
    type Filter = MachineTypeFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let machine_type = sqlx::query_as::<_, MachineType>(
            r#"
            INSERT INTO machine_types (id, category_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(MachineTypeDBResponse::from(machine_type))
    }

    #[instrument(skip(self), fields(machine_type_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let machine_type =
            sqlx::query_as::<_, MachineType>("SELECT * FROM machine_types WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(machine_type.map(MachineTypeDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(
        &mut self,
        ids: Vec<MachineTypeId>,
    ) -> Result<std::collections::HashMap<MachineTypeId, MachineTypeDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let machine_types =
            sqlx::query_as::<_, MachineType>("SELECT * FROM machine_types WHERE id = ANY($1)")
                .bind(ids.as_slice())
                .fetch_all(&mut *self.db)
                .await?;

        Ok(machine_types
            .into_iter()
            .map(|t| (t.id, MachineTypeDBResponse::from(t)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM machine_types WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY name LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let machine_types = query
            .build_query_as::<MachineType>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(machine_types
            .into_iter()
            .map(MachineTypeDBResponse::from)
            .collect())
    }

    #[instrument(skip(self), fields(machine_type_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM machine_types WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(machine_type_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let machine_type = sqlx::query_as::<_, MachineType>(
            r#"
            UPDATE machine_types SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?
        .ok_or(DbError::NotFound)?;

        Ok(MachineTypeDBResponse::from(machine_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::categories::Categories;
    use crate::db::models::categories::CategoryCreateDBRequest;
    use sqlx::PgPool;

    async fn create_category(conn: &mut PgConnection, name: &str) -> CategoryId {
        Categories::new(conn)
            .create(&CategoryCreateDBRequest {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id
    }

    fn create_request(category_id: CategoryId, name: &str) -> MachineTypeCreateDBRequest {
        MachineTypeCreateDBRequest {
            category_id,
            name: name.to_string(),
            description: Some("Test type".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_machine_type(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let category_id = create_category(&mut conn, "Lathes").await;

        let mut repo = MachineTypes::new(&mut conn);
        let created = repo.create(&create_request(category_id, "Turret Lathe")).await.unwrap();
        assert_eq!(created.category_id, category_id);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Turret Lathe");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_category_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = MachineTypes::new(&mut conn);

        let err = repo
            .create(&create_request(Uuid::new_v4(), "Orphan Type"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_within_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let lathes = create_category(&mut conn, "Lathes").await;
        let presses = create_category(&mut conn, "Presses").await;

        let mut repo = MachineTypes::new(&mut conn);
        repo.create(&create_request(lathes, "Standard")).await.unwrap();

        // Same name in another category is fine
        repo.create(&create_request(presses, "Standard")).await.unwrap();

        let err = repo.create(&create_request(lathes, "Standard")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation {
                constraint: Some(ref c),
                ..
            } if c == "machine_types_category_id_name_key"
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filtered_by_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let lathes = create_category(&mut conn, "Lathes").await;
        let presses = create_category(&mut conn, "Presses").await;

        let mut repo = MachineTypes::new(&mut conn);
        repo.create(&create_request(lathes, "Turret Lathe")).await.unwrap();
        repo.create(&create_request(lathes, "Engine Lathe")).await.unwrap();
        repo.create(&create_request(presses, "Hydraulic Press")).await.unwrap();

        let filter = MachineTypeFilter::new(0, 10).with_category(lathes);
        let results = repo.list(&filter).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let searched = repo
            .list(&MachineTypeFilter::new(0, 10).with_search("hydraulic".to_string()))
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].name, "Hydraulic Press");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_category_delete_blocked_by_types(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let category_id = create_category(&mut conn, "Lathes").await;

        MachineTypes::new(&mut conn)
            .create(&create_request(category_id, "Turret Lathe"))
            .await
            .unwrap();

        let err = Categories::new(&mut conn).delete(category_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_machine_type(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let category_id = create_category(&mut conn, "Lathes").await;

        let mut repo = MachineTypes::new(&mut conn);
        let created = repo.create(&create_request(category_id, "Turret Lathe")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &MachineTypeUpdateDBRequest {
                    category_id: None,
                    name: Some("CNC Turret Lathe".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "CNC Turret Lathe");
        assert_eq!(updated.category_id, category_id);
    }
}
