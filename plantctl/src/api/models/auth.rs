//! API request/response models for authentication.

use crate::api::models::users::UserResponse;
use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for registering a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Unique username
    #[schema(example = "jdoe")]
    pub username: String,
    /// Unique email address, used for login
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    /// Plaintext password, validated against the configured length bounds
    pub password: String,
    /// Optional display name
    pub display_name: Option<String>,
}

/// Request body for logging in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

/// Generic success message for auth operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Info about whether registration is available.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationInfo {
    pub enabled: bool,
    pub message: String,
}

/// Info about whether native login is available.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginInfo {
    pub enabled: bool,
    pub message: String,
}

/// Register result: 201 with the auth body and a session cookie.
#[derive(Debug)]
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(SET_COOKIE, self.cookie)],
            Json(self.auth_response),
        )
            .into_response()
    }
}

/// Login result: 200 with the auth body and a session cookie.
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(SET_COOKIE, self.cookie)],
            Json(self.auth_response),
        )
            .into_response()
    }
}

/// Logout result: 200 with an expired cookie that clears the session.
#[derive(Debug)]
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(SET_COOKIE, self.cookie)],
            Json(self.auth_response),
        )
            .into_response()
    }
}
