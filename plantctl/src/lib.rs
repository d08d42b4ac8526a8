//! Asset and maintenance backend for small manufacturing operations.
//!
//! plantctl keeps a plant's machine registry (categories, types, machines),
//! the documents attached to each machine, and its maintenance history and
//! schedule, behind a role-based HTTP API. Each machine carries a QR
//! deep-link that resolves through an unauthenticated lookup endpoint.
//!
//! # Modules
//!
//! - [`api`]: HTTP handlers and request/response models
//! - [`auth`]: Sessions, password hashing, and permission checks
//! - [`config`]: Layered YAML/environment configuration
//! - [`db`]: Repositories, domain models, and document storage
//! - [`errors`]: The service error type and its HTTP mapping
//! - [`openapi`]: OpenAPI document served at `/docs`
//! - [`telemetry`]: Tracing subscriber setup

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Router,
};
use bon::Builder;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::api::models::users::Role;
use crate::auth::password;
use crate::config::CorsOrigin;
pub use crate::config::Config;
use crate::db::handlers::{DocumentStorage, Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::types::UserId;

/// Shared application state available to all handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub document_storage: Arc<dyn DocumentStorage>,
}

/// Embedded database migrations.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Ensure the configured admin account exists.
///
/// Idempotent: if the account already exists its password is re-keyed when
/// one is configured, otherwise the account is created with the admin role.
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: password::Argon2Params,
    db: &PgPool,
) -> anyhow::Result<UserId> {
    let password_hash = match password {
        Some(pwd) => Some(
            password::hash_string_with_params(pwd, Some(params))
                .context("Failed to hash admin password")?,
        ),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo
        .get_user_by_email(email)
        .await
        .context("Failed to check existing user")?
    {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
                .bind(password_hash)
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        username: email.to_string(),
        email: email.to_string(),
        display_name: None,
        is_admin: true,
        roles: vec![Role::Admin],
        auth_source: "system".to_string(),
        password_hash,
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .context("Failed to create admin user")?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Connect to the configured database, run migrations, and seed the admin
/// account.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = match &config.database_url {
        Some(url) => url.clone(),
        None => config.database.url().to_string(),
    };

    let pool_settings = config.database.pool();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(pool_settings.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(pool_settings.max_lifetime_secs))
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    migrator().run(&pool).await.context("Failed to run migrations")?;

    let hash_params = password::Argon2Params::from(&config.auth.native.password);
    create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), hash_params, &pool)
        .await
        .context("Failed to create initial admin user")?;

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // tower-http panics if `*` is passed to `AllowOrigin::list`; a wildcard
    // origin must be expressed as `AllowOrigin::any()`.
    let allow_origin = if config.auth.security.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.auth.security.cors.allowed_origins {
            let header_value = match origin {
                CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
                CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
            };
            origins.push(header_value);
        }
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .max_age(std::time::Duration::from_secs(config.auth.security.cors.max_age_secs));

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Authentication routes and the public QR lookup sit at the root; the
/// resource API is nested under `/api/v1`. The document upload route gets
/// its own body limit from `storage.max_document_size`.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Authentication routes, at root level
    let auth_routes = Router::new()
        .route(
            "/authentication/register",
            get(api::handlers::auth::get_registration_info).post(api::handlers::auth::register),
        )
        .route(
            "/authentication/login",
            get(api::handlers::auth::get_login_info).post(api::handlers::auth::login),
        )
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .with_state(state.clone());

    // Document upload gets a body limit matching the configured document cap,
    // with headroom for the other multipart fields
    let upload_limit = state.config.storage.max_document_size.saturating_add(64 * 1024);
    let upload_router = Router::new().route(
        "/documents",
        post(api::handlers::documents::upload_document)
            .layer(DefaultBodyLimit::max(upload_limit as usize)),
    );

    let api_routes = Router::new()
        // Catalogue hierarchy
        .route("/categories", get(api::handlers::categories::list_categories))
        .route("/categories", post(api::handlers::categories::create_category))
        .route("/categories/{id}", get(api::handlers::categories::get_category))
        .route("/categories/{id}", patch(api::handlers::categories::update_category))
        .route("/categories/{id}", delete(api::handlers::categories::delete_category))
        .route("/types", get(api::handlers::machine_types::list_machine_types))
        .route("/types", post(api::handlers::machine_types::create_machine_type))
        .route("/types/{id}", get(api::handlers::machine_types::get_machine_type))
        .route("/types/{id}", patch(api::handlers::machine_types::update_machine_type))
        .route("/types/{id}", delete(api::handlers::machine_types::delete_machine_type))
        .route("/machines", get(api::handlers::machines::list_machines))
        .route("/machines", post(api::handlers::machines::create_machine))
        .route("/machines/{id}", get(api::handlers::machines::get_machine))
        .route("/machines/{id}", patch(api::handlers::machines::update_machine))
        .route("/machines/{id}", delete(api::handlers::machines::delete_machine))
        // Documents (upload route merged with its own body limit)
        .merge(upload_router)
        .route("/documents", get(api::handlers::documents::list_documents))
        .route("/documents/{id}", get(api::handlers::documents::get_document))
        .route("/documents/{id}/content", get(api::handlers::documents::download_document))
        .route("/documents/{id}", patch(api::handlers::documents::update_document))
        .route("/documents/{id}", delete(api::handlers::documents::delete_document))
        // Maintenance history and schedule
        .route("/maintenances", get(api::handlers::maintenances::list_maintenances))
        .route("/maintenances", post(api::handlers::maintenances::create_maintenance))
        .route("/maintenances/{id}", get(api::handlers::maintenances::get_maintenance))
        .route("/maintenances/{id}", patch(api::handlers::maintenances::update_maintenance))
        .route("/maintenances/{id}", delete(api::handlers::maintenances::delete_maintenance))
        .route(
            "/scheduled-maintenances",
            get(api::handlers::scheduled_maintenances::list_scheduled_maintenances),
        )
        .route(
            "/scheduled-maintenances",
            post(api::handlers::scheduled_maintenances::create_scheduled_maintenance),
        )
        .route(
            "/scheduled-maintenances/{id}",
            get(api::handlers::scheduled_maintenances::get_scheduled_maintenance),
        )
        .route(
            "/scheduled-maintenances/{id}",
            patch(api::handlers::scheduled_maintenances::update_scheduled_maintenance),
        )
        .route(
            "/scheduled-maintenances/{id}",
            delete(api::handlers::scheduled_maintenances::delete_scheduled_maintenance),
        )
        // Favorites and search
        .route("/favorites", get(api::handlers::favorites::list_favorites))
        .route("/favorites", post(api::handlers::favorites::add_favorite))
        .route("/favorites/{id}", delete(api::handlers::favorites::remove_favorite))
        .route("/search", get(api::handlers::search::search))
        // Users
        .route("/users/me", get(api::handlers::users::get_current_user))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/public/machines/{id}",
            get(api::handlers::machines::get_public_machine),
        )
        .with_state(state.clone())
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", openapi::openapi_spec()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A fully initialized application: database connected and migrated,
/// storage backend ready, router built.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Create an application on an existing pool. Migrations are assumed to
    /// have run; the admin account is still seeded.
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        debug!("Starting plantctl with configuration: {:#?}", config);

        config.validate()?;

        let document_storage = db::handlers::create_document_storage(&config.storage).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .document_storage(document_storage)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert the application into a test server.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service())
            .expect("Failed to create test server")
    }

    /// Start serving the application until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("plantctl listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::api::models::users::Role;
    use crate::auth::password::Argon2Params;
    use crate::db::handlers::Users;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn admin_seeding_is_idempotent(pool: PgPool) {
        let params = Argon2Params::default();
        let first = create_initial_admin_user("admin@example.com", Some("first password"), params, &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin@example.com", Some("second password"), params, &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let admin = repo.get_user_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert!(admin.roles.contains(&Role::Admin));
        assert_eq!(admin.auth_source, "system");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn admin_seeding_without_password(pool: PgPool) {
        create_initial_admin_user("admin@example.com", None, Argon2Params::default(), &pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let admin = repo.get_user_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(admin.password_hash.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn admin_seeding_hashes_with_given_params(pool: PgPool) {
        let params = Argon2Params {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        };
        create_initial_admin_user("admin@example.com", Some("seed password"), params, &pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let admin = repo.get_user_by_email("admin@example.com").await.unwrap().unwrap();
        // PHC strings embed the cost parameters
        assert!(admin.password_hash.unwrap().contains("m=8192,t=1,p=1"));
    }
}
