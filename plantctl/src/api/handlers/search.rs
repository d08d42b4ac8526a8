use crate::api::models::search::{SearchQuery, SearchResponse};
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::search::Search;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    summary = "Search across machines, documents, and maintenance records",
    description = "Case-insensitive substring search. Each result group is capped at `limit` entries.",
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Empty search term"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(SearchQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    _: RequiresPermission<resource::Machines, operation::ReadAll>,
) -> Result<Json<SearchResponse>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(Error::BadRequest {
            message: "Search term must not be empty".to_string(),
        });
    }
    let limit = query.limit();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Search::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let results = repo.search(term, limit).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(SearchResponse::from(results)))
}
