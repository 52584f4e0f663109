//! Process configuration for the dealer core.
//!
//! # Responsibility
//! - Collect database target, connection and logging settings in one place.
//! - Read overrides from `DEALER_*` environment variables.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors.
//! - Logging stays disabled unless a log directory is configured.

use crate::db::{open_db_in_memory_with, open_db_with, ConnectionOptions, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "DEALER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "DEALER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DEALER_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "DEALER_BUSY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database: DatabaseTarget,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub connection: ConnectionOptions,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseTarget::Memory,
            log_level: default_log_level().to_string(),
            log_dir: None,
            connection: ConnectionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars = std::env::vars().collect::<HashMap<_, _>>();
        Self::from_vars(&vars)
    }

    /// Reads configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(vars, key);

        if let Some(path) = get(ENV_DB_PATH) {
            config.database = if path == ":memory:" {
                DatabaseTarget::Memory
            } else {
                DatabaseTarget::File(PathBuf::from(path))
            };
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level.to_string();
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = get(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.to_string(),
            })?;
            config.connection.busy_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        init_logging(&self.log_level, &dir.to_string_lossy())?;
        Ok(true)
    }

    /// Opens and migrates the configured database with the configured
    /// connection options, whichever the target.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseTarget::File(path) => open_db_with(path, &self.connection),
            DatabaseTarget::Memory => open_db_in_memory_with(&self.connection),
        }
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, DatabaseTarget, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH, ENV_LOG_DIR,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.database, DatabaseTarget::Memory);
        assert!(!config.init_logging().unwrap());
    }

    #[test]
    fn variables_override_defaults() {
        let config = CoreConfig::from_vars(&vars(&[
            (ENV_DB_PATH, "/var/lib/dealer/core.db"),
            (ENV_LOG_DIR, "/var/log/dealer"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseTarget::File(PathBuf::from("/var/lib/dealer/core.db"))
        );
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/dealer")));
        assert_eq!(config.connection.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        let err = CoreConfig::from_vars(&vars(&[(ENV_BUSY_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn memory_target_applies_configured_busy_timeout() {
        let config = CoreConfig::from_vars(&vars(&[
            (ENV_DB_PATH, ":memory:"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]))
        .unwrap();
        assert_eq!(config.database, DatabaseTarget::Memory);

        let conn = config.open_db().unwrap();
        let timeout_ms: i64 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout_ms, 250);
    }

    #[test]
    fn file_target_opens_migrated_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            database: DatabaseTarget::File(dir.path().join("dealer.db")),
            ..CoreConfig::default()
        };
        let conn = config.open_db().unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::db::migrations::latest_version());
    }
}
