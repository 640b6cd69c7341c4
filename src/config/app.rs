//! Application configuration loaded from `pos-ledger.toml`.
//!
//! Every field has a default so the binary runs without a config file. The
//! `DATABASE_URL` and `POS_API_URL` environment variables (usually from `.env`)
//! override whatever the file says.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default location of the application config file
pub const DEFAULT_CONFIG_PATH: &str = "pos-ledger.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Remote API settings used by the HTTP client
    pub api: ApiConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
    /// Upper bound of pooled connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// Seconds to wait for a connection before failing
    pub connect_timeout_secs: u64,
    /// Log every SQL statement at `debug`
    pub log_statements: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/pos_ledger.sqlite?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 8,
            log_statements: false,
        }
    }
}

impl DatabaseConfig {
    /// Connect timeout as a [`Duration`]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whether the URL points at an in-memory `SQLite` database.
    #[must_use]
    pub fn is_sqlite_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory")
    }
}

/// `[api]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the POS HTTP API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML is malformed or has fields of the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config: {e}"),
    })
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads the application configuration the binary runs with.
///
/// Reads `path` when it exists, falls back to defaults when it does not, then
/// applies environment overrides.
///
/// # Errors
/// Returns an error if an existing file cannot be read or parsed.
pub fn load_app_configuration<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    let mut config = if path_ref.exists() {
        load_config(path_ref)?
    } else {
        info!(
            "No config file at {}, using defaults",
            path_ref.display()
        );
        AppConfig::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `DATABASE_URL` and `POS_API_URL` overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        debug!("DATABASE_URL overrides configured database url");
        config.database.url = url;
    }
    if let Some(url) = lookup("POS_API_URL") {
        debug!("POS_API_URL overrides configured api base url");
        config.api.base_url = url;
    }
}
