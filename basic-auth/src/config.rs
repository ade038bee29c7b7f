//! Store configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::database::default_pool_size;
use crate::{Error, Result};

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:basic-auth.db?mode=rwc";

/// Which credential collection backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Process-local map behind a single lock.
    Memory,
    /// SQLite database accessed through transactions.
    #[default]
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" | "database" | "db" => Ok(Self::Sqlite),
            other => Err(Error::config(format!("unknown credentials backend '{}'", other))),
        }
    }
}

/// The privileged service-account pair accepted by `api_credentials_match`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub username: String,
    pub password: String,
}

impl ApiCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Exact comparison against the configured pair.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub database_url: String,
    pub max_connections: u32,
    pub api_credentials: Option<ApiCredentials>,
    /// Directory for rotated log files; console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: default_pool_size(),
            api_credentials: None,
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Create a StoreConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CREDENTIALS_BACKEND`: `memory` or `sqlite` (default: sqlite)
    /// - `DATABASE_URL`: SQLite URL (default: `sqlite:basic-auth.db?mode=rwc`)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 2 x CPU cores, at most 10)
    /// - `API_USERNAME` / `API_PASSWORD`: privileged API credentials, both or neither
    /// - `LOG_DIR`: directory for daily-rotated log files
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("CREDENTIALS_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };

        let database_url = get("DATABASE_URL").unwrap_or(defaults.database_url);

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("invalid DATABASE_MAX_CONNECTIONS '{}'", value)))?,
            None => defaults.max_connections,
        };

        let api_credentials = match (get("API_USERNAME"), get("API_PASSWORD")) {
            (Some(username), Some(password)) => Some(ApiCredentials::new(username, password)),
            (None, None) => None,
            _ => {
                return Err(Error::config(
                    "API_USERNAME and API_PASSWORD must be set together",
                ));
            }
        };

        let log_dir = get("LOG_DIR").map(PathBuf::from);

        Ok(Self {
            backend,
            database_url,
            max_connections,
            api_credentials,
            log_dir,
        })
    }
}
