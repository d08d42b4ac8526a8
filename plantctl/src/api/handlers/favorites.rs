use crate::api::models::documents::DocumentResponse;
use crate::api::models::favorites::{FavoriteCreate, FavoriteResponse};
use crate::api::models::pagination::{PaginatedResponse, Pagination};
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::Favorites;
use crate::errors::{Error, Result};
use crate::types::DocumentId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    summary = "List favorite documents",
    description = "Returns the calling user's favorite documents, most recently added first.",
    responses(
        (status = 200, description = "Favorite documents", body = PaginatedResponse<DocumentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(Pagination),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    current_user: RequiresPermission<resource::Favorites, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<DocumentResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = pagination.params();
    let mut repo = Favorites::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let documents = repo.list_for_user(current_user.id, skip, limit).await?;
    let total_count = repo.count_for_user(current_user.id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = documents.into_iter().map(DocumentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/favorites",
    tag = "favorites",
    summary = "Add favorite",
    description = "Marks a document as a favorite for the calling user. Adding an existing favorite is a no-op.",
    request_body = FavoriteCreate,
    responses(
        (status = 201, description = "Favorite added", body = FavoriteResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Favorites, operation::CreateOwn>,
    Json(create): Json<FavoriteCreate>,
) -> Result<(StatusCode, Json<FavoriteResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Favorites::new(&mut pool_conn);

    let changed = repo.add(current_user.id, create.document_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(FavoriteResponse {
            document_id: create.document_id,
            changed,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/favorites/{document_id}",
    tag = "favorites",
    summary = "Remove favorite",
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Document was not a favorite"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("document_id" = uuid::Uuid, Path, description = "Document ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
    current_user: RequiresPermission<resource::Favorites, operation::DeleteOwn>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Favorites::new(&mut pool_conn);

    if repo.remove(current_user.id, document_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Favorite".to_string(),
            id: document_id.to_string(),
        })
    }
}
