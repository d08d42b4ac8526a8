use crate::api::models::machine_types::{
    ListMachineTypesQuery, MachineTypeCreate, MachineTypeResponse, MachineTypeUpdate,
};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{machine_types::MachineTypeFilter, MachineTypes, Repository};
use crate::db::models::machine_types::{MachineTypeCreateDBRequest, MachineTypeUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::MachineTypeId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/types",
    tag = "machine-types",
    summary = "List machine types",
    responses(
        (status = 200, description = "List of machine types", body = PaginatedResponse<MachineTypeResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListMachineTypesQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_machine_types(
    State(state): State<AppState>,
    Query(query): Query<ListMachineTypesQuery>,
    _: RequiresPermission<resource::MachineTypes, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<MachineTypeResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = MachineTypeFilter::new(skip, limit);
    if let Some(category_id) = query.category_id {
        filter = filter.with_category(category_id);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut repo = MachineTypes::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let types = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = types.into_iter().map(MachineTypeResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/types",
    tag = "machine-types",
    summary = "Create machine type",
    request_body = MachineTypeCreate,
    responses(
        (status = 201, description = "Machine type created successfully", body = MachineTypeResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "A type with this name already exists in the category"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_machine_type(
    State(state): State<AppState>,
    _: RequiresPermission<resource::MachineTypes, operation::CreateAll>,
    Json(create): Json<MachineTypeCreate>,
) -> Result<(StatusCode, Json<MachineTypeResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MachineTypes::new(&mut pool_conn);
    let request = MachineTypeCreateDBRequest::from(create);

    let machine_type = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(MachineTypeResponse::from(machine_type))))
}

#[utoipa::path(
    get,
    path = "/types/{type_id}",
    tag = "machine-types",
    summary = "Get machine type",
    responses(
        (status = 200, description = "Machine type details", body = MachineTypeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine type not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("type_id" = uuid::Uuid, Path, description = "Machine type ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_machine_type(
    State(state): State<AppState>,
    Path(type_id): Path<MachineTypeId>,
    _: RequiresPermission<resource::MachineTypes, operation::ReadAll>,
) -> Result<Json<MachineTypeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MachineTypes::new(&mut pool_conn);

    match repo.get_by_id(type_id).await? {
        Some(machine_type) => Ok(Json(MachineTypeResponse::from(machine_type))),
        None => Err(Error::NotFound {
            resource: "MachineType".to_string(),
            id: type_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/types/{type_id}",
    tag = "machine-types",
    summary = "Update machine type",
    request_body = MachineTypeUpdate,
    responses(
        (status = 200, description = "Machine type updated successfully", body = MachineTypeResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine type or target category not found"),
        (status = 409, description = "A type with this name already exists in the category"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("type_id" = uuid::Uuid, Path, description = "Machine type ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_machine_type(
    State(state): State<AppState>,
    Path(type_id): Path<MachineTypeId>,
    _: RequiresPermission<resource::MachineTypes, operation::UpdateAll>,
    Json(update): Json<MachineTypeUpdate>,
) -> Result<Json<MachineTypeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MachineTypes::new(&mut pool_conn);
    let request = MachineTypeUpdateDBRequest::from(update);

    let machine_type = repo.update(type_id, &request).await?;
    Ok(Json(MachineTypeResponse::from(machine_type)))
}

#[utoipa::path(
    delete,
    path = "/types/{type_id}",
    tag = "machine-types",
    summary = "Delete machine type",
    description = "Deleting a type that still has machines attached is rejected with 409.",
    responses(
        (status = 204, description = "Machine type deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine type not found"),
        (status = 409, description = "Type still has machines attached"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("type_id" = uuid::Uuid, Path, description = "Machine type ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_machine_type(
    State(state): State<AppState>,
    Path(type_id): Path<MachineTypeId>,
    _: RequiresPermission<resource::MachineTypes, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MachineTypes::new(&mut pool_conn);

    if repo.delete(type_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "MachineType".to_string(),
            id: type_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::categories::{CategoryCreate, CategoryResponse};
    use crate::api::models::users::Role;
    use crate::test_utils::{bearer_token_for, create_test_app, create_test_user};
    use sqlx::PgPool;

    async fn create_category(
        server: &axum_test::TestServer,
        token: &str,
        name: &str,
    ) -> CategoryResponse {
        let response = server
            .post("/api/v1/categories")
            .authorization_bearer(token)
            .json(&CategoryCreate {
                name: name.to_string(),
                description: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_machine_type_crud(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let category = create_category(&server, &token, "Lathes").await;

        let response = server
            .post("/api/v1/types")
            .authorization_bearer(&token)
            .json(&MachineTypeCreate {
                category_id: category.id,
                name: "Turret Lathe".to_string(),
                description: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: MachineTypeResponse = response.json();

        let response = server
            .get(&format!("/api/v1/types/{}", created.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();

        let response = server
            .patch(&format!("/api/v1/types/{}", created.id))
            .authorization_bearer(&token)
            .json(&MachineTypeUpdate {
                category_id: None,
                name: Some("CNC Turret Lathe".to_string()),
                description: None,
            })
            .await;
        response.assert_status_ok();
        let updated: MachineTypeResponse = response.json();
        assert_eq!(updated.name, "CNC Turret Lathe");
        assert_eq!(updated.category_id, category.id);

        let response = server
            .delete(&format!("/api/v1/types/{}", created.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_missing_category_is_not_found(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);

        let response = server
            .post("/api/v1/types")
            .authorization_bearer(&token)
            .json(&MachineTypeCreate {
                category_id: uuid::Uuid::new_v4(),
                name: "Orphan Type".to_string(),
                description: None,
            })
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_category(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let lathes = create_category(&server, &token, "Lathes").await;
        let presses = create_category(&server, &token, "Presses").await;

        for (category_id, name) in [
            (lathes.id, "Turret Lathe"),
            (lathes.id, "Engine Lathe"),
            (presses.id, "Hydraulic Press"),
        ] {
            server
                .post("/api/v1/types")
                .authorization_bearer(&token)
                .json(&MachineTypeCreate {
                    category_id,
                    name: name.to_string(),
                    description: None,
                })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/api/v1/types?category_id={}", lathes.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total_count"], 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_category_with_types_conflicts(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let category = create_category(&server, &token, "Grinders").await;

        server
            .post("/api/v1/types")
            .authorization_bearer(&token)
            .json(&MachineTypeCreate {
                category_id: category.id,
                name: "Surface Grinder".to_string(),
                description: None,
            })
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .delete(&format!("/api/v1/categories/{}", category.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }
}
