use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::scheduled_maintenances::{
    ListScheduledMaintenancesQuery, ScheduledMaintenanceCreate, ScheduledMaintenanceResponse,
    ScheduledMaintenanceUpdate,
};
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{
    scheduled_maintenances::ScheduledMaintenanceFilter, Repository, ScheduledMaintenances,
};
use crate::db::models::scheduled_maintenances::{
    ScheduledMaintenanceCreateDBRequest, ScheduledMaintenanceUpdateDBRequest,
};
use crate::errors::{Error, Result};
use crate::types::ScheduledMaintenanceId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/scheduled-maintenances",
    tag = "scheduled-maintenances",
    summary = "List scheduled maintenance",
    description = "Entries are ordered by due date, soonest first. Use `due_before` to list overdue or upcoming work.",
    responses(
        (status = 200, description = "List of scheduled maintenance entries", body = PaginatedResponse<ScheduledMaintenanceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListScheduledMaintenancesQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_scheduled_maintenances(
    State(state): State<AppState>,
    Query(query): Query<ListScheduledMaintenancesQuery>,
    _: RequiresPermission<resource::ScheduledMaintenances, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<ScheduledMaintenanceResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = ScheduledMaintenanceFilter::new(skip, limit);
    if let Some(machine_id) = query.machine_id {
        filter = filter.with_machine(machine_id);
    }
    if let Some(due_before) = query.due_before {
        filter = filter.with_due_before(due_before);
    }

    let mut repo =
        ScheduledMaintenances::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let entries = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = entries.into_iter().map(ScheduledMaintenanceResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/scheduled-maintenances",
    tag = "scheduled-maintenances",
    summary = "Schedule maintenance",
    request_body = ScheduledMaintenanceCreate,
    responses(
        (status = 201, description = "Maintenance scheduled successfully", body = ScheduledMaintenanceResponse),
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
pub async fn create_scheduled_maintenance(
    State(state): State<AppState>,
    _: RequiresPermission<resource::ScheduledMaintenances, operation::CreateAll>,
    Json(create): Json<ScheduledMaintenanceCreate>,
) -> Result<(StatusCode, Json<ScheduledMaintenanceResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ScheduledMaintenances::new(&mut pool_conn);
    let request = ScheduledMaintenanceCreateDBRequest::from(create);

    let entry = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(ScheduledMaintenanceResponse::from(entry))))
}

#[utoipa::path(
    get,
    path = "/scheduled-maintenances/{entry_id}",
    tag = "scheduled-maintenances",
    summary = "Get scheduled maintenance entry",
    responses(
        (status = 200, description = "Scheduled maintenance details", body = ScheduledMaintenanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Scheduled maintenance entry not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("entry_id" = uuid::Uuid, Path, description = "Scheduled maintenance entry ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_scheduled_maintenance(
    State(state): State<AppState>,
    Path(entry_id): Path<ScheduledMaintenanceId>,
    _: RequiresPermission<resource::ScheduledMaintenances, operation::ReadAll>,
) -> Result<Json<ScheduledMaintenanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ScheduledMaintenances::new(&mut pool_conn);

    match repo.get_by_id(entry_id).await? {
        Some(entry) => Ok(Json(ScheduledMaintenanceResponse::from(entry))),
        None => Err(Error::NotFound {
            resource: "ScheduledMaintenance".to_string(),
            id: entry_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/scheduled-maintenances/{entry_id}",
    tag = "scheduled-maintenances",
    summary = "Update scheduled maintenance entry",
    request_body = ScheduledMaintenanceUpdate,
    responses(
        (status = 200, description = "Scheduled maintenance updated successfully", body = ScheduledMaintenanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Scheduled maintenance entry not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("entry_id" = uuid::Uuid, Path, description = "Scheduled maintenance entry ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_scheduled_maintenance(
    State(state): State<AppState>,
    Path(entry_id): Path<ScheduledMaintenanceId>,
    _: RequiresPermission<resource::ScheduledMaintenances, operation::UpdateAll>,
    Json(update): Json<ScheduledMaintenanceUpdate>,
) -> Result<Json<ScheduledMaintenanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ScheduledMaintenances::new(&mut pool_conn);
    let request = ScheduledMaintenanceUpdateDBRequest::from(update);

    let entry = repo.update(entry_id, &request).await?;
    Ok(Json(ScheduledMaintenanceResponse::from(entry)))
}

#[utoipa::path(
    delete,
    path = "/scheduled-maintenances/{entry_id}",
    tag = "scheduled-maintenances",
    summary = "Delete scheduled maintenance entry",
    responses(
        (status = 204, description = "Scheduled maintenance deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Scheduled maintenance entry not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("entry_id" = uuid::Uuid, Path, description = "Scheduled maintenance entry ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_scheduled_maintenance(
    State(state): State<AppState>,
    Path(entry_id): Path<ScheduledMaintenanceId>,
    _: RequiresPermission<resource::ScheduledMaintenances, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ScheduledMaintenances::new(&mut pool_conn);

    if repo.delete(entry_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "ScheduledMaintenance".to_string(),
            id: entry_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::models::scheduled_maintenances::MaintenanceFrequency;
    use crate::test_utils::{
        bearer_token_for, create_test_app, create_test_machine, create_test_user,
    };
    use chrono::NaiveDate;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_schedule_and_reschedule(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/scheduled-maintenances")
            .authorization_bearer(&token)
            .json(&ScheduledMaintenanceCreate {
                machine_id: machine.id,
                description: "Quarterly lubrication".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                frequency: MaintenanceFrequency::Quarterly,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ScheduledMaintenanceResponse = response.json();
        assert_eq!(created.frequency, MaintenanceFrequency::Quarterly);

        let response = server
            .patch(&format!("/api/v1/scheduled-maintenances/{}", created.id))
            .authorization_bearer(&token)
            .json(&ScheduledMaintenanceUpdate {
                description: None,
                due_date: Some(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()),
                frequency: None,
            })
            .await;
        response.assert_status_ok();
        let updated: ScheduledMaintenanceResponse = response.json();
        assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(updated.frequency, MaintenanceFrequency::Quarterly);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_due_before_filter(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let machine = create_test_machine(&pool).await;

        for (due, description) in [
            (NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(), "Filter change"),
            (NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), "Belt inspection"),
        ] {
            server
                .post("/api/v1/scheduled-maintenances")
                .authorization_bearer(&token)
                .json(&ScheduledMaintenanceCreate {
                    machine_id: machine.id,
                    description: description.to_string(),
                    due_date: due,
                    frequency: MaintenanceFrequency::Annually,
                })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/api/v1/scheduled-maintenances?due_before=2026-10-01")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["data"][0]["description"], "Filter change");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_scheduling_is_admin_only(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/scheduled-maintenances")
            .authorization_bearer(&token)
            .json(&ScheduledMaintenanceCreate {
                machine_id: machine.id,
                description: "Unauthorized schedule".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                frequency: MaintenanceFrequency::Monthly,
            })
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
