//! OpenAPI documentation.
//!
//! The resource API lives under `/api/v1` and is documented by
//! [`ApiV1Doc`]; authentication and the public QR lookup live at the
//! root and are documented by [`RootApiDoc`]. [`openapi_spec`] nests the
//! two into the single document served at `/docs`.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Registers the two ways of presenting a session token.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            Tokens are issued by the login and register endpoints.",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "plantctl_session",
                    "HTTP-only session cookie set by the login and register endpoints.",
                ))),
            );
        }
    }
}

/// Resource endpoints nested under `/api/v1`.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::categories::list_categories,
        api::handlers::categories::create_category,
        api::handlers::categories::get_category,
        api::handlers::categories::update_category,
        api::handlers::categories::delete_category,
        api::handlers::machine_types::list_machine_types,
        api::handlers::machine_types::create_machine_type,
        api::handlers::machine_types::get_machine_type,
        api::handlers::machine_types::update_machine_type,
        api::handlers::machine_types::delete_machine_type,
        api::handlers::machines::list_machines,
        api::handlers::machines::create_machine,
        api::handlers::machines::get_machine,
        api::handlers::machines::update_machine,
        api::handlers::machines::delete_machine,
        api::handlers::documents::list_documents,
        api::handlers::documents::upload_document,
        api::handlers::documents::get_document,
        api::handlers::documents::download_document,
        api::handlers::documents::update_document,
        api::handlers::documents::delete_document,
        api::handlers::maintenances::list_maintenances,
        api::handlers::maintenances::create_maintenance,
        api::handlers::maintenances::get_maintenance,
        api::handlers::maintenances::update_maintenance,
        api::handlers::maintenances::delete_maintenance,
        api::handlers::scheduled_maintenances::list_scheduled_maintenances,
        api::handlers::scheduled_maintenances::create_scheduled_maintenance,
        api::handlers::scheduled_maintenances::get_scheduled_maintenance,
        api::handlers::scheduled_maintenances::update_scheduled_maintenance,
        api::handlers::scheduled_maintenances::delete_scheduled_maintenance,
        api::handlers::favorites::list_favorites,
        api::handlers::favorites::add_favorite,
        api::handlers::favorites::remove_favorite,
        api::handlers::search::search,
        api::handlers::users::get_current_user,
    ),
    components(
        schemas(
            api::models::categories::CategoryCreate,
            api::models::categories::CategoryUpdate,
            api::models::categories::CategoryResponse,
            api::models::machine_types::MachineTypeCreate,
            api::models::machine_types::MachineTypeUpdate,
            api::models::machine_types::MachineTypeResponse,
            api::models::machines::MachineCreate,
            api::models::machines::MachineUpdate,
            api::models::machines::MachineResponse,
            api::models::documents::DocumentUploadForm,
            api::models::documents::DocumentUpdate,
            api::models::documents::DocumentResponse,
            api::models::maintenances::MaintenanceCreate,
            api::models::maintenances::MaintenanceUpdate,
            api::models::maintenances::MaintenanceResponse,
            api::models::scheduled_maintenances::ScheduledMaintenanceCreate,
            api::models::scheduled_maintenances::ScheduledMaintenanceUpdate,
            api::models::scheduled_maintenances::ScheduledMaintenanceResponse,
            api::models::favorites::FavoriteCreate,
            api::models::favorites::FavoriteResponse,
            api::models::search::SearchResponse,
            api::models::users::UserResponse,
            api::models::users::Role,
            crate::db::models::scheduled_maintenances::MaintenanceFrequency,
        )
    ),
    tags(
        (name = "categories", description = "Machine categories"),
        (name = "machine-types", description = "Machine types within a category"),
        (name = "machines", description = "The machine registry"),
        (name = "documents", description = "Machine documents and their content"),
        (name = "maintenances", description = "Completed maintenance records"),
        (name = "scheduled-maintenances", description = "Planned maintenance"),
        (name = "favorites", description = "Per-user favorite documents"),
        (name = "search", description = "Cross-entity search"),
        (name = "users", description = "User accounts")
    )
)]
pub struct ApiV1Doc;

/// Root-level endpoints: authentication and the public QR lookup.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::get_registration_info,
        api::handlers::auth::register,
        api::handlers::auth::get_login_info,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::machines::get_public_machine,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::auth::RegistrationInfo,
            api::models::auth::LoginInfo,
            api::models::machines::MachinePublicResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login, and logout")
    )
)]
pub struct RootApiDoc;

/// The merged document served at `/docs`.
pub fn openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = RootApiDoc::openapi();
    spec.info.title = "plantctl".to_string();
    spec.info.description =
        Some("Asset and maintenance backend for small manufacturing operations".to_string());
    spec.nest("/api/v1", ApiV1Doc::openapi())
}
