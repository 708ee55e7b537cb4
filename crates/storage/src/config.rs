//! Storage configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use aq_common::{AqError, AqResult};

/// Connection settings for the primary store and the local fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Primary (PostgreSQL) connection string
    pub database_url: String,

    /// Schema namespace used to qualify tables on the primary store.
    /// `None` means flat table names even on the primary.
    pub schema: Option<String>,

    /// Location of the self-seeding SQLite fallback store
    pub fallback_path: PathBuf,

    /// Upper bound on the primary liveness probe
    pub probe_timeout: Duration,

    /// Pool size for the primary store
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://postgres:postgres@db:5432/emissions".to_string(),
            schema: Some("air".to_string()),
            fallback_path: PathBuf::from("data/demo.db"),
            probe_timeout: Duration::from_secs(5),
            max_connections: 10,
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> AqResult<Self> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        // An explicitly empty DATABASE_SCHEMA disables qualification.
        let schema = match env::var("DATABASE_SCHEMA") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => defaults.schema,
        };

        let fallback_path = env::var("FALLBACK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.fallback_path);

        let probe_timeout = env::var("DATABASE_PROBE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.probe_timeout);

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);

        let config = Self {
            database_url,
            schema,
            fallback_path,
            probe_timeout,
            max_connections,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject schema names that cannot be spliced into SQL as a bare identifier.
    pub fn validate(&self) -> AqResult<()> {
        if let Some(schema) = &self.schema {
            if !is_sql_identifier(schema) {
                return Err(AqError::InvalidConfig(format!(
                    "schema '{}' is not a plain SQL identifier",
                    schema
                )));
            }
        }

        if self.max_connections == 0 {
            return Err(AqError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
