//! Database repository for machine categories.

use crate::types::{abbrev_uuid, CategoryId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing categories
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl CategoryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
        }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDBResponse {
    fn from(row: Category) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CategoryFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM categories WHERE 1=1");
        push_search(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_search(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &CategoryFilter) {
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
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(CategoryDBResponse::from(category))
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category.map(CategoryDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CategoryId>) -> Result<std::collections::HashMap<CategoryId, CategoryDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories
            .into_iter()
            .map(|c| (c.id, CategoryDBResponse::from(c)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM categories WHERE 1=1");
        push_search(&mut query, filter);

        query.push(" ORDER BY name LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let categories = query.build_query_as::<Category>().fetch_all(&mut *self.db).await?;

        Ok(categories.into_iter().map(CategoryDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(category_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(CategoryDBResponse::from(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn create_request(name: &str) -> CategoryCreateDBRequest {
        CategoryCreateDBRequest {
            name: name.to_string(),
            description: Some("Test category".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let created = repo.create(&create_request("Lathes")).await.unwrap();
        assert_eq!(created.name, "Lathes");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.description, Some("Test category".to_string()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&create_request("Presses")).await.unwrap();
        let err = repo.create(&create_request("Presses")).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::UniqueViolation {
                constraint: Some(ref c),
                ..
            } if c == "categories_name_key"
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&create_request("CNC Mills")).await.unwrap();
        repo.create(&create_request("Band Saws")).await.unwrap();

        let filter = CategoryFilter::new(0, 10).with_search("cnc".to_string());
        let results = repo.list(&filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "CNC Mills");

        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        assert_eq!(repo.count(&CategoryFilter::new(0, 10)).await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let created = repo.create(&create_request("Grinders")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &CategoryUpdateDBRequest {
                    name: Some("Surface Grinders".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Surface Grinders");
        // Unset fields keep their previous values
        assert_eq!(updated.description, Some("Test category".to_string()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_category_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let err = repo
            .update(
                Uuid::new_v4(),
                &CategoryUpdateDBRequest {
                    name: Some("Ghost".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let created = repo.create(&create_request("Welders")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
