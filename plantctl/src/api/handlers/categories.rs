use crate::api::models::categories::{
    CategoryCreate, CategoryResponse, CategoryUpdate, ListCategoriesQuery,
};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{categories::CategoryFilter, Categories, Repository};
use crate::db::models::categories::{CategoryCreateDBRequest, CategoryUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::CategoryId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    summary = "List categories",
    responses(
        (status = 200, description = "List of categories", body = PaginatedResponse<CategoryResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListCategoriesQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
    _: RequiresPermission<resource::Categories, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<CategoryResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = CategoryFilter::new(skip, limit);
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut repo = Categories::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let categories = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = categories.into_iter().map(CategoryResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    summary = "Create category",
    request_body = CategoryCreate,
    responses(
        (status = 201, description = "Category created successfully", body = CategoryResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A category with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Categories, operation::CreateAll>,
    Json(create): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut pool_conn);
    let request = CategoryCreateDBRequest::from(create);

    let category = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[utoipa::path(
    get,
    path = "/categories/{category_id}",
    tag = "categories",
    summary = "Get category",
    responses(
        (status = 200, description = "Category details", body = CategoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("category_id" = uuid::Uuid, Path, description = "Category ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
    _: RequiresPermission<resource::Categories, operation::ReadAll>,
) -> Result<Json<CategoryResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut pool_conn);

    match repo.get_by_id(category_id).await? {
        Some(category) => Ok(Json(CategoryResponse::from(category))),
        None => Err(Error::NotFound {
            resource: "Category".to_string(),
            id: category_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/categories/{category_id}",
    tag = "categories",
    summary = "Update category",
    request_body = CategoryUpdate,
    responses(
        (status = 200, description = "Category updated successfully", body = CategoryResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "A category with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("category_id" = uuid::Uuid, Path, description = "Category ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
    _: RequiresPermission<resource::Categories, operation::UpdateAll>,
    Json(update): Json<CategoryUpdate>,
) -> Result<Json<CategoryResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut pool_conn);
    let request = CategoryUpdateDBRequest::from(update);

    let category = repo.update(category_id, &request).await?;
    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/categories/{category_id}",
    tag = "categories",
    summary = "Delete category",
    description = "Deleting a category that still has machine types attached is rejected with 409.",
    responses(
        (status = 204, description = "Category deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has machine types attached"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("category_id" = uuid::Uuid, Path, description = "Category ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
    _: RequiresPermission<resource::Categories, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut pool_conn);

    if repo.delete(category_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Category".to_string(),
            id: category_id.to_string(),
        })
    }
}
