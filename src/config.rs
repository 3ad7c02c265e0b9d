use std::{env, path::PathBuf};

/// Fallback JWT secret used only when running locally without `JWT_SECRET`.
const LOCAL_JWT_SECRET: &str = "catchpedia-local-dev-secret-change-me";
/// Fallback admin password used only when running locally without `ADMIN_PASSWORD`.
const LOCAL_ADMIN_PASSWORD: &str = "admin123";

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is immutable once
/// loaded and is pulled into handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls secret fallbacks and the cookie `Secure` flag.
    pub env: Env,
    // HMAC secret used to sign and verify user session tokens.
    pub jwt_secret: String,
    // Lifetime of a user session token (and its cookie), in hours.
    pub session_ttl_hours: i64,
    // Argon2 time cost (iterations) used when hashing new passwords.
    pub password_hash_cost: u32,
    // Shared admin password checked by `/api/admin-login`.
    pub admin_password: String,
    // Which persistence backend to open at startup.
    pub storage_backend: StorageBackend,
    // Location of the JSON document when `storage_backend` is `File`.
    pub data_path: PathBuf,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (fallback secrets, plain-HTTP cookies) and hardened production behaviour.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// StorageBackend
///
/// The single persistence backend selected by deployment configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StorageBackend {
    File,
    Memory,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a deterministic, non-panicking configuration for test setup.
    /// Uses the in-memory backend and the cheapest argon2 cost so tests stay fast.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            session_ttl_hours: 168,
            password_hash_cost: 1,
            admin_password: LOCAL_ADMIN_PASSWORD.to_string(),
            storage_backend: StorageBackend::Memory,
            data_path: PathBuf::from("data/catchpedia.json"),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if `JWT_SECRET` or `ADMIN_PASSWORD` is missing in production, or if a
    /// numeric variable cannot be parsed. Locally both secrets fall back to known
    /// development values and a warning is logged.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = required_secret(&env, "JWT_SECRET", LOCAL_JWT_SECRET);
        let admin_password = required_secret(&env, "ADMIN_PASSWORD", LOCAL_ADMIN_PASSWORD);

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .map(|v| v.parse().expect("FATAL: SESSION_TTL_HOURS must be an integer"))
            .unwrap_or(168);

        let password_hash_cost = env::var("PASSWORD_HASH_COST")
            .map(|v| v.parse().expect("FATAL: PASSWORD_HASH_COST must be an integer"))
            .unwrap_or(2);

        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("file") | Err(_) => StorageBackend::File,
            Ok(other) => panic!("FATAL: unknown STORAGE_BACKEND '{other}' (expected file or memory)"),
        };

        Self {
            env,
            jwt_secret,
            session_ttl_hours,
            password_hash_cost,
            admin_password,
            storage_backend,
            data_path: env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/catchpedia.json")),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }

    /// Whether cookies issued by this process should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

/// required_secret
///
/// Resolves a secret that production must set explicitly. Locally an empty or missing
/// value falls back to `local_default`, loudly.
fn required_secret(env: &Env, key: &str, local_default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ if *env == Env::Production => panic!("FATAL: {key} must be set in production."),
        _ => {
            tracing::warn!("{key} is not set; using the insecure local fallback");
            local_default.to_string()
        }
    }
}
