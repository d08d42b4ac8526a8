//! Application configuration.
//!
//! Configuration is layered with figment: a YAML file, then environment
//! variables prefixed `PLANTCTL_` (nested fields separated by `__`), then
//! a raw `DATABASE_URL` override. `Config::load` extracts and validates
//! the merged result.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "plantctl", about = "Asset and maintenance backend for small manufacturing operations")]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long, env = "PLANTCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds to
    pub host: String,
    pub port: u16,

    /// Raw connection string override; takes precedence over `database.url`
    /// when set (populated from the DATABASE_URL environment variable)
    pub database_url: Option<String>,
    pub database: DatabaseConfig,

    /// Initial admin account, created (or re-keyed) on startup
    pub admin_email: String,
    pub admin_password: Option<String>,

    /// Key used to sign session tokens. Required when native auth is enabled.
    pub secret_key: Option<String>,

    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_email: "admin@localhost".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum DatabaseConfig {
    External {
        url: String,
        #[serde(default)]
        pool: PoolSettings,
    },
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::External {
            url: "postgres://localhost:5432/plantctl".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> &str {
        match self {
            DatabaseConfig::External { url, .. } => url,
        }
    }

    pub fn pool(&self) -> &PoolSettings {
        match self {
            DatabaseConfig::External { pool, .. } => pool,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub native: NativeAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    pub enabled: bool,
    pub allow_registration: bool,
    pub password: PasswordConfig,
    pub session: SessionConfig,
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Argon2id memory cost in KiB
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            // OWASP-recommended Argon2id parameters
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "plantctl_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "Strict".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Session token lifetime
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "*" {
            return Ok(CorsOrigin::Wildcard);
        }
        let url = Url::parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid CORS origin '{raw}': {e}")))?;
        Ok(CorsOrigin::Url(url))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the `local` backend
    pub path: PathBuf,
    /// Maximum accepted document upload size in bytes
    pub max_document_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            path: PathBuf::from("./document-store"),
            max_document_size: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    /// Discards content; retrieval always fails. Only useful in tests.
    Noop,
}

impl Config {
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config: Config = Self::figment(&args.config).extract()?;

        // DATABASE_URL wins over the file-configured URL
        if let Some(url) = config.database_url.clone() {
            let DatabaseConfig::External { pool, .. } = config.database;
            config.database = DatabaseConfig::External { url, pool };
        }

        config.validate()?;
        Ok(config)
    }

    fn figment(config_path: &str) -> Figment {
        Figment::new()
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed("PLANTCTL_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.native.enabled && self.secret_key.is_none() {
            anyhow::bail!("secret_key must be set when native authentication is enabled");
        }

        let password = &self.auth.native.password;
        if password.min_length > password.max_length {
            anyhow::bail!(
                "password min_length ({}) cannot exceed max_length ({})",
                password.min_length,
                password.max_length
            );
        }

        let expiry = self.auth.security.jwt_expiry;
        if expiry < Duration::from_secs(5 * 60) || expiry > Duration::from_secs(30 * 24 * 60 * 60) {
            anyhow::bail!("jwt_expiry must be between 5 minutes and 30 days");
        }

        let cors = &self.auth.security.cors;
        if cors.allowed_origins.is_empty() {
            anyhow::bail!("cors.allowed_origins must not be empty");
        }
        if cors.allow_credentials && cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
            anyhow::bail!("cors cannot combine a wildcard origin with allow_credentials");
        }

        if self.storage.max_document_size == 0 {
            anyhow::bail!("storage.max_document_size must be greater than zero");
        }
        if self.storage.backend == StorageBackend::Local && self.storage.path.as_os_str().is_empty() {
            anyhow::bail!("storage.path must be set for the local storage backend");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            secret_key: Some("test-secret".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_are_valid_with_secret_key() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn native_auth_requires_secret_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_password_lengths() {
        let mut config = valid_config();
        config.auth.native.password.min_length = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_jwt_expiry() {
        let mut config = valid_config();
        config.auth.security.jwt_expiry = Duration::from_secs(60);
        assert!(config.validate().is_err());

        config.auth.security.jwt_expiry = Duration::from_secs(365 * 24 * 60 * 60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_wildcard_cors_with_credentials() {
        let mut config = valid_config();
        config.auth.security.cors.allow_credentials = true;
        assert!(config.validate().is_err());

        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("https://plant.example.com".parse().unwrap())];
        config.validate().unwrap();
    }

    #[test]
    fn loads_from_yaml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                host: "127.0.0.1"
                port: 4000
                secret_key: "file-secret"
                database:
                  type: external
                  url: "postgres://db.internal:5432/plantctl"
                auth:
                  security:
                    jwt_expiry: "12h"
                storage:
                  backend: local
                  path: "/var/lib/plantctl/documents"
                "#,
            )?;

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 4000);
            assert_eq!(config.database.url(), "postgres://db.internal:5432/plantctl");
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(12 * 60 * 60));
            assert_eq!(config.storage.path, PathBuf::from("/var/lib/plantctl/documents"));
            Ok(())
        });
    }

    #[test]
    fn env_vars_override_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                port: 4000
                secret_key: "file-secret"
                "#,
            )?;
            jail.set_env("PLANTCTL_PORT", "5000");
            jail.set_env("PLANTCTL_AUTH__NATIVE__ALLOW_REGISTRATION", "false");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.port, 5000);
            assert!(!config.auth.native.allow_registration);
            Ok(())
        });
    }

    #[test]
    fn database_url_env_overrides_database_section() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                secret_key: "file-secret"
                database:
                  type: external
                  url: "postgres://file-host:5432/plantctl"
                "#,
            )?;
            jail.set_env("DATABASE_URL", "postgres://env-host:5432/plantctl");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.database.url(), "postgres://env-host:5432/plantctl");
            Ok(())
        });
    }
}
