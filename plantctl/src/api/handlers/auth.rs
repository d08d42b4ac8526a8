//! Native registration, login, and logout.
//!
//! Sessions are JWTs delivered both in the response body (via the session
//! cookie header) and accepted as bearer tokens. Passwords are hashed with
//! Argon2id on a blocking thread so the runtime stays responsive.

use crate::api::models::auth::{
    AuthResponse, AuthSuccessResponse, LoginInfo, LoginRequest, LoginResponse, LogoutResponse,
    RegisterRequest, RegisterResponse, RegistrationInfo,
};
use crate::api::models::users::{CurrentUser, Role, UserResponse};
use crate::auth::{password, session};
use crate::config::Config;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{extract::State, Json};

/// Format a Set-Cookie value carrying the session token.
fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.native.session;
    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session.cookie_name,
        token,
        session.cookie_secure,
        session.cookie_same_site,
        config.auth.security.jwt_expiry.as_secs()
    )
}

/// Format a Set-Cookie value that clears the session.
fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        config.auth.native.session.cookie_name
    )
}

fn validate_password(password: &str, config: &Config) -> Result<()> {
    let bounds = &config.auth.native.password;
    if password.len() < bounds.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters long", bounds.min_length),
        });
    }
    if password.len() > bounds.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters long", bounds.max_length),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/authentication/register",
    tag = "authentication",
    summary = "Registration availability",
    responses(
        (status = 200, description = "Whether self-registration is available", body = RegistrationInfo)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_registration_info(State(state): State<AppState>) -> Json<RegistrationInfo> {
    let native = &state.config.auth.native;
    let enabled = native.enabled && native.allow_registration;
    let message = if enabled {
        "Registration is open".to_string()
    } else {
        "Registration is disabled".to_string()
    };
    Json(RegistrationInfo { enabled, message })
}

#[utoipa::path(
    post,
    path = "/authentication/register",
    tag = "authentication",
    summary = "Register account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; session cookie set", body = AuthResponse),
        (status = 400, description = "Registration disabled, invalid password, or email already in use"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<RegisterResponse> {
    let native = &state.config.auth.native;
    if !native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    if !native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }
    validate_password(&request.password, &state.config)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    if repo.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "An account with this email address already exists".to_string(),
        });
    }

    let password = request.password;
    let hash_params = password::Argon2Params::from(&state.config.auth.native.password);
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(hash_params)))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })??;

    let user = repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            display_name: request.display_name,
            is_admin: false,
            roles: vec![Role::StandardUser],
            auth_source: "native".to_string(),
            password_hash: Some(password_hash),
        })
        .await?;

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Account created".to_string(),
        },
        cookie,
    })
}

#[utoipa::path(
    get,
    path = "/authentication/login",
    tag = "authentication",
    summary = "Login availability",
    responses(
        (status = 200, description = "Whether native login is available", body = LoginInfo)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_login_info(State(state): State<AppState>) -> Json<LoginInfo> {
    let enabled = state.config.auth.native.enabled;
    let message = if enabled {
        "Native login is available".to_string()
    } else {
        "Native login is disabled".to_string()
    };
    Json(LoginInfo { enabled, message })
}

#[utoipa::path(
    post,
    path = "/authentication/login",
    tag = "authentication",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = AuthResponse),
        (status = 400, description = "Native authentication is disabled"),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<LoginResponse> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = repo
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;
    let password_hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    let password = request.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_string(&password, &password_hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })??;
    if !verified {
        return Err(invalid_credentials());
    }

    repo.touch_last_login(user.id).await?;

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Logged in".to_string(),
        },
        cookie,
    })
}

#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    summary = "Log out",
    responses(
        (status = 200, description = "Session cookie cleared", body = AuthSuccessResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logged out".to_string(),
        },
        cookie: clear_session_cookie(&state.config),
    }
}
