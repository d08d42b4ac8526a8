use crate::api::models::users::{CurrentUser, UserResponse};
use crate::db::handlers::{Repository, Users};
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    summary = "Get current user",
    responses(
        (status = 200, description = "The authenticated user's profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    match repo.get_by_id(current_user.id).await? {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err(Error::NotFound {
            resource: "User".to_string(),
            id: current_user.id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{bearer_token_for, create_test_app, create_test_user};
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_returns_profile(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, Role::StandardUser).await;
        let token = bearer_token_for(&user);

        let response = server.get("/api/v1/users/me").authorization_bearer(&token).await;
        response.assert_status_ok();
        let body: UserResponse = response.json();
        assert_eq!(body.id, user.id);
        assert_eq!(body.email, user.email);
        assert!(body.roles.contains(&Role::StandardUser));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_requires_auth(pool: PgPool) {
        let server = create_test_app(pool).await;
        server.get("/api/v1/users/me").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}
