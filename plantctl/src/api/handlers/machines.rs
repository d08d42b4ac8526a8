use crate::api::models::machines::{
    ListMachinesQuery, MachineCreate, MachinePublicResponse, MachineResponse, MachineUpdate,
};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{operation, resource, RequiresPermission};
use crate::db::handlers::{machines::MachineFilter, Machines, Repository};
use crate::db::models::machines::{MachineCreateDBRequest, MachineUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::MachineId;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::Acquire;

#[utoipa::path(
    get,
    path = "/machines",
    tag = "machines",
    summary = "List machines",
    responses(
        (status = 200, description = "List of machines", body = PaginatedResponse<MachineResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    params(ListMachinesQuery),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_machines(
    State(state): State<AppState>,
    Query(query): Query<ListMachinesQuery>,
    _: RequiresPermission<resource::Machines, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<MachineResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let mut filter = MachineFilter::new(skip, limit);
    if let Some(machine_type_id) = query.machine_type_id {
        filter = filter.with_machine_type(machine_type_id);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut repo = Machines::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
    let machines = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let data = machines.into_iter().map(MachineResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/machines",
    tag = "machines",
    summary = "Register machine",
    request_body = MachineCreate,
    responses(
        (status = 201, description = "Machine registered successfully", body = MachineResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine type not found"),
        (status = 409, description = "A machine with this serial number already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_machine(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Machines, operation::CreateAll>,
    Json(create): Json<MachineCreate>,
) -> Result<(StatusCode, Json<MachineResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Machines::new(&mut pool_conn);
    let request = MachineCreateDBRequest::from(create);

    let machine = repo.create(&request).await?;
    Ok((StatusCode::CREATED, Json(MachineResponse::from(machine))))
}

#[utoipa::path(
    get,
    path = "/machines/{machine_id}",
    tag = "machines",
    summary = "Get machine",
    responses(
        (status = 200, description = "Machine details", body = MachineResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("machine_id" = uuid::Uuid, Path, description = "Machine ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<MachineId>,
    _: RequiresPermission<resource::Machines, operation::ReadAll>,
) -> Result<Json<MachineResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Machines::new(&mut pool_conn);

    match repo.get_by_id(machine_id).await? {
        Some(machine) => Ok(Json(MachineResponse::from(machine))),
        None => Err(Error::NotFound {
            resource: "Machine".to_string(),
            id: machine_id.to_string(),
        }),
    }
}

/// Unauthenticated lookup backing the QR code printed on each machine.
/// Serves a reduced shape so internal notes never leave the plant.
#[utoipa::path(
    get,
    path = "/public/machines/{machine_id}",
    tag = "machines",
    summary = "Public machine lookup",
    description = "Resolves a QR deep-link to basic machine details. No authentication required.",
    responses(
        (status = 200, description = "Machine details", body = MachinePublicResponse),
        (status = 404, description = "Machine not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("machine_id" = uuid::Uuid, Path, description = "Machine ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_public_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<MachineId>,
) -> Result<Json<MachinePublicResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Machines::new(&mut pool_conn);

    match repo.get_by_id(machine_id).await? {
        Some(machine) => Ok(Json(MachinePublicResponse::from(machine))),
        None => Err(Error::NotFound {
            resource: "Machine".to_string(),
            id: machine_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/machines/{machine_id}",
    tag = "machines",
    summary = "Update machine",
    request_body = MachineUpdate,
    responses(
        (status = 200, description = "Machine updated successfully", body = MachineResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine or target type not found"),
        (status = 409, description = "A machine with this serial number already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("machine_id" = uuid::Uuid, Path, description = "Machine ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<MachineId>,
    _: RequiresPermission<resource::Machines, operation::UpdateAll>,
    Json(update): Json<MachineUpdate>,
) -> Result<Json<MachineResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Machines::new(&mut pool_conn);
    let request = MachineUpdateDBRequest::from(update);

    let machine = repo.update(machine_id, &request).await?;
    Ok(Json(MachineResponse::from(machine)))
}

#[utoipa::path(
    delete,
    path = "/machines/{machine_id}",
    tag = "machines",
    summary = "Delete machine",
    description = "Deleting a machine that still has documents, maintenance records, or scheduled maintenance attached is rejected with 409.",
    responses(
        (status = 204, description = "Machine deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Machine not found"),
        (status = 409, description = "Machine still has dependent records"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("machine_id" = uuid::Uuid, Path, description = "Machine ID")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_machine(
    State(state): State<AppState>,
    Path(machine_id): Path<MachineId>,
    _: RequiresPermission<resource::Machines, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Machines::new(&mut pool_conn);

    if repo.delete(machine_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Machine".to_string(),
            id: machine_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{
        bearer_token_for, create_test_app, create_test_machine, create_test_user,
    };
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_machine_crud(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let machine = create_test_machine(&pool).await;

        let response = server
            .get(&format!("/api/v1/machines/{}", machine.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();

        let response = server
            .patch(&format!("/api/v1/machines/{}", machine.id))
            .authorization_bearer(&token)
            .json(&MachineUpdate {
                machine_type_id: None,
                name: None,
                serial_number: None,
                manufacturer: None,
                location: Some("Hall C, bay 1".to_string()),
                notes: None,
            })
            .await;
        response.assert_status_ok();
        let updated: MachineResponse = response.json();
        assert_eq!(updated.location.as_deref(), Some("Hall C, bay 1"));
        assert_eq!(updated.serial_number, machine.serial_number);

        let response = server
            .delete(&format!("/api/v1/machines/{}", machine.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_serial_number_conflicts(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let token = bearer_token_for(&admin);
        let machine = create_test_machine(&pool).await;

        let response = server
            .post("/api/v1/machines")
            .authorization_bearer(&token)
            .json(&MachineCreate {
                machine_type_id: machine.machine_type_id,
                name: "Another Machine".to_string(),
                serial_number: machine.serial_number.clone(),
                manufacturer: None,
                location: None,
                notes: None,
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_lookup_needs_no_auth(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let machine = create_test_machine(&pool).await;

        let response = server.get(&format!("/public/machines/{}", machine.id)).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["serial_number"], machine.serial_number);
        // Internal notes are not exposed publicly
        assert!(body.get("notes").is_none());

        let response = server
            .get(&format!("/public/machines/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_authenticated_machine_list_requires_token(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);
        create_test_machine(&pool).await;

        server.get("/api/v1/machines").await.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/machines")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total_count"], 1);
    }
}
