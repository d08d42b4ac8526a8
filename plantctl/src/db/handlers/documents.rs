//! Database repository for document metadata.
//!
//! Only metadata lives in postgres. The bytes themselves live behind the
//! [`DocumentStorage`](crate::db::handlers::document_storage::DocumentStorage)
//! backend, addressed by `storage_key`.

use crate::types::{abbrev_uuid, DocumentId, MachineId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing documents
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub machine_id: Option<MachineId>,
}

impl DocumentFilter {
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
struct Document {
    pub id: DocumentId,
    pub machine_id: MachineId,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: Uuid,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentDBResponse {
    fn from(row: Document) -> Self {
        Self {
            id: row.id,
            machine_id: row.machine_id,
            title: row.title,
            file_name: row.file_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            storage_key: row.storage_key,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct Documents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Documents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &DocumentFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &DocumentFilter) {
    if let Some(machine_id) = filter.machine_id {
        query.push(" AND machine_id = ");
        query.push_bind(machine_id);
    }
    if let Some(ref search) = filter.search {
        let search_pattern = format!("%{}%", super::escape_like(&search.to_lowercase()));
        query.push(" AND (LOWER(title) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(file_name) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Documents<'c> {
    type CreateRequest = DocumentCreateDBRequest;
    type UpdateRequest = DocumentUpdateDBRequest;
    type Response = DocumentDBResponse;
    type Id = DocumentId;
    type Filter = DocumentFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (id, machine_id, title, file_name, content_type, size_bytes, storage_key, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.machine_id)
        .bind(&request.title)
        .bind(&request.file_name)
        .bind(&request.content_type)
        .bind(request.size_bytes)
        .bind(request.storage_key)
        .bind(request.uploaded_by)
        .fetch_one(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?;

        Ok(DocumentDBResponse::from(document))
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let document = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(document.map(DocumentDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(
        &mut self,
        ids: Vec<DocumentId>,
    ) -> Result<std::collections::HashMap<DocumentId, DocumentDBResponse>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let documents = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(documents
            .into_iter()
            .map(|d| (d.id, DocumentDBResponse::from(d)))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM documents WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let documents = query.build_query_as::<Document>().fetch_all(&mut *self.db).await?;

        Ok(documents.into_iter().map(DocumentDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents SET
                machine_id = COALESCE($2, machine_id),
                title = COALESCE($3, title),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.machine_id)
        .bind(&request.title)
        .fetch_optional(&mut *self.db)
        .await
        .map_err(|e| DbError::from(e).missing_parent_as_not_found())?
        .ok_or(DbError::NotFound)?;

        Ok(DocumentDBResponse::from(document))
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

    fn create_request(machine_id: MachineId, title: &str) -> DocumentCreateDBRequest {
        DocumentCreateDBRequest {
            machine_id,
            title: title.to_string(),
            file_name: "manual.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 1024,
            storage_key: Uuid::new_v4(),
            uploaded_by: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_document(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        let mut repo = Documents::new(&mut conn);
        let created = repo.create(&create_request(machine_id, "Operator manual")).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Operator manual");
        assert_eq!(fetched.size_bytes, 1024);
        assert_eq!(fetched.storage_key, created.storage_key);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_machine_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Documents::new(&mut conn);

        let err = repo.create(&create_request(Uuid::new_v4(), "Orphan")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_machine_and_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        let mut repo = Documents::new(&mut conn);
        repo.create(&create_request(machine_id, "Operator manual")).await.unwrap();
        repo.create(&create_request(machine_id, "Wiring diagram")).await.unwrap();

        let filter = DocumentFilter::new(0, 10).with_machine(machine_id);
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let searched = repo
            .list(&DocumentFilter::new(0, 10).with_search("wiring".to_string()))
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].title, "Wiring diagram");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_machine_delete_blocked_by_documents(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        Documents::new(&mut conn)
            .create(&create_request(machine_id, "Operator manual"))
            .await
            .unwrap();

        let err = Machines::new(&mut conn).delete(machine_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete_document(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let machine_id = create_machine(&mut conn).await;

        let mut repo = Documents::new(&mut conn);
        let created = repo.create(&create_request(machine_id, "Operator manual")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &DocumentUpdateDBRequest {
                    machine_id: None,
                    title: Some("Operator manual (rev B)".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Operator manual (rev B)");
        assert_eq!(updated.file_name, "manual.pdf");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
