//! Shared helpers for integration tests.
//!
//! Available in unit tests and, behind the `test-utils` feature, to
//! downstream integration tests.

use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    api::models::{
        machines::MachineResponse,
        users::{CurrentUser, Role, UserResponse},
    },
    auth::session,
    config::{Config, StorageBackend},
    db::handlers::{Categories, Documents, Machines, MachineTypes, Repository, Users},
    db::models::{
        categories::CategoryCreateDBRequest,
        documents::{DocumentCreateDBRequest, DocumentDBResponse},
        machine_types::MachineTypeCreateDBRequest,
        machines::MachineCreateDBRequest,
        users::UserCreateDBRequest,
    },
    types::MachineId,
    Application,
};

/// Test configuration: port 0, fixed signing key, small document cap, and
/// local storage under the system temp directory.
pub fn create_test_config() -> Config {
    let mut config = Config {
        port: 0,
        admin_email: "admin@test.local".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Config::default()
    };
    config.auth.native.enabled = true;
    config.auth.native.allow_registration = true;
    config.storage.backend = StorageBackend::Local;
    config.storage.path = std::env::temp_dir().join("plantctl-test-storage");
    config.storage.max_document_size = 1024 * 1024;
    config
}

/// Build a test server on an existing pool (as provided by `#[sqlx::test]`).
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let app = Application::new_with_pool(create_test_config(), pool)
        .await
        .expect("Failed to create test application");
    app.into_test_server()
}

/// Create a user directly in the database. `Role::Admin` produces an admin
/// account; names are uuid-suffixed so tests can create several.
pub async fn create_test_user(pool: &PgPool, role: Role) -> UserResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let is_admin = role == Role::Admin;
    let mut roles = vec![role];
    if is_admin {
        roles.push(Role::StandardUser);
    }

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Users::new(&mut conn);
    let user = repo
        .create(&UserCreateDBRequest {
            username: format!("testuser_{suffix}"),
            email: format!("testuser_{suffix}@test.local"),
            display_name: None,
            is_admin,
            roles,
            auth_source: "test".to_string(),
            password_hash: None,
        })
        .await
        .expect("Failed to create test user");
    UserResponse::from(user)
}

/// Mint a bearer token for a test user, signed with the test secret key.
pub fn bearer_token_for(user: &UserResponse) -> String {
    let current_user = CurrentUser::from(user.clone());
    session::create_session_token(&current_user, &create_test_config())
        .expect("Failed to create session token")
}

/// Create a category, a machine type, and a machine, returning the machine.
pub async fn create_test_machine(pool: &PgPool) -> MachineResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    let category = Categories::new(&mut conn)
        .create(&CategoryCreateDBRequest {
            name: format!("Category {suffix}"),
            description: None,
        })
        .await
        .expect("Failed to create test category");

    let machine_type = MachineTypes::new(&mut conn)
        .create(&MachineTypeCreateDBRequest {
            category_id: category.id,
            name: format!("Type {suffix}"),
            description: None,
        })
        .await
        .expect("Failed to create test machine type");

    let machine = Machines::new(&mut conn)
        .create(&MachineCreateDBRequest {
            machine_type_id: machine_type.id,
            name: format!("Machine {suffix}"),
            serial_number: format!("SN-{}", &suffix[..8]),
            manufacturer: Some("Test Industries".to_string()),
            location: Some("Hall A".to_string()),
            notes: None,
        })
        .await
        .expect("Failed to create test machine");

    MachineResponse::from(machine)
}

/// Insert a document row for a machine. The storage key points at nothing;
/// use the upload endpoint when the content itself matters.
pub async fn create_test_document(pool: &PgPool, machine_id: MachineId) -> DocumentDBResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Documents::new(&mut conn)
        .create(&DocumentCreateDBRequest {
            machine_id,
            title: format!("Document {suffix}"),
            file_name: format!("doc_{suffix}.pdf"),
            content_type: "application/pdf".to_string(),
            size_bytes: 128,
            storage_key: Uuid::new_v4(),
            uploaded_by: None,
        })
        .await
        .expect("Failed to create test document")
}
