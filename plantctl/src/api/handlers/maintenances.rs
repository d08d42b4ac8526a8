use crate::api::models::maintenances::{
    ListMaintenancesQuery, MaintenanceCreate, MaintenanceResponse, MaintenanceUpdate,
};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{maintenances::MaintenanceFilter, Maintenances, Repository};
use crate::db::models::maintenances::{MaintenanceCreateDBRequest, MaintenanceUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::MaintenanceId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/maintenances",
    tag = "maintenances",
    summary = "List maintenance records",
    responses(
        (status = 200, description = "List of maintenance records", body = PaginatedResponse<MaintenanceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListMaintenancesQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_maintenances(
    State(state): State<AppState>,
    Query(query): Query<ListMaintenancesQuery>,
    _: RequiresPermission<resource::Maintenances, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<MaintenanceResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = MaintenanceFilter::new(skip, limit);
    if let Some(machine_id) = query.machine_id {
        filter = filter.with_machine(machine_id);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut repo = Maintenances::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let maintenances = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = maintenances.into_iter().map(MaintenanceResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/maintenances",
    tag = "maintenances",
    summary = "Record maintenance",
    description = "Records completed maintenance. The performing user is taken from the session.",
    request_body = MaintenanceCreate,
    responses(
        (status = 201, description = "Maintenance recorded successfully", body = MaintenanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Maintenances, operation::CreateOwn>,
    Json(create): Json<MaintenanceCreate>,
) -> Result<(StatusCode, Json<MaintenanceResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Maintenances::new(&mut pool_conn);

    let request = MaintenanceCreateDBRequest {
        machine_id: create.machine_id,
        description: create.description,
        performed_at: create.performed_at,
        performed_by: Some(current_user.id),
        notes: create.notes,
    };

    let maintenance = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(MaintenanceResponse::from(maintenance))))
}

#[utoipa::path(
    get,
    path = "/maintenances/{maintenance_id}",
    tag = "maintenances",
    summary = "Get maintenance record",
    responses(
        (status = 200, description = "Maintenance record details", body = MaintenanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Maintenance record not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("maintenance_id" = uuid::Uuid, Path, description = "Maintenance record ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_maintenance(
    State(state): State<AppState>,
    Path(maintenance_id): Path<MaintenanceId>,
    _: RequiresPermission<resource::Maintenances, operation::ReadAll>,
) -> Result<Json<MaintenanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Maintenances::new(&mut pool_conn);

    match repo.get_by_id(maintenance_id).await? {
        Some(maintenance) => Ok(Json(MaintenanceResponse::from(maintenance))),
        None => Err(Error::NotFound {
            resource: "Maintenance".to_string(),
            id: maintenance_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/maintenances/{maintenance_id}",
    tag = "maintenances",
    summary = "Update maintenance record",
    request_body = MaintenanceUpdate,
    responses(
        (status = 200, description = "Maintenance record updated successfully", body = MaintenanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Maintenance record not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("maintenance_id" = uuid::Uuid, Path, description = "Maintenance record ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_maintenance(
    State(state): State<AppState>,
    Path(maintenance_id): Path<MaintenanceId>,
    _: RequiresPermission<resource::Maintenances, operation::UpdateAll>,
    Json(update): Json<MaintenanceUpdate>,
) -> Result<Json<MaintenanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Maintenances::new(&mut pool_conn);
    let request = MaintenanceUpdateDBRequest::from(update);

    let maintenance = repo.update(maintenance_id, &request).await?;
    Ok(Json(MaintenanceResponse::from(maintenance)))
}

#[utoipa::path(
    delete,
    path = "/maintenances/{maintenance_id}",
    tag = "maintenances",
    summary = "Delete maintenance record",
    responses(
        (status = 204, description = "Maintenance record deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Maintenance record not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("maintenance_id" = uuid::Uuid, Path, description = "Maintenance record ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_maintenance(
    State(state): State<AppState>,
    Path(maintenance_id): Path<MaintenanceId>,
    _: RequiresPermission<resource::Maintenances, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Maintenances::new(&mut pool_conn);

    if repo.delete(maintenance_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Maintenance".to_string(),
            id: maintenance_id.to_string(),
        })
    }
}
