//! Primary-store connectivity with automatic fallback to a local demo store.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{error, info, instrument, warn};

use aq_common::{AqError, AqResult};

use crate::config::StorageConfig;
use crate::mode::StorageMode;
use crate::seed;
use crate::session::Session;

/// Connection pool for whichever store is live.
#[derive(Debug, Clone)]
pub enum Backend {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Run the same sqlx expression against the backend's concrete pool.
macro_rules! on_pool {
    ($backend:expr, $pool:ident => $body:expr) => {
        match $backend {
            $crate::adapter::Backend::Postgres($pool) => $body,
            $crate::adapter::Backend::Sqlite($pool) => $body,
        }
    };
}
pub(crate) use on_pool;

/// Handle to the resolved store.
///
/// Built once per process by [`StorageAdapter::connect`]; the primary is not
/// retried later in the process lifetime.
#[derive(Debug, Clone)]
pub struct StorageAdapter {
    backend: Backend,
    mode: StorageMode,
}

impl StorageAdapter {
    /// Probe the primary store once; on any connectivity failure provision
    /// and seed the fallback store instead.
    ///
    /// Only a fallback provisioning failure is returned as an error.
    #[instrument(skip(config), fields(fallback = %config.fallback_path.display()))]
    pub async fn connect(config: &StorageConfig) -> AqResult<Self> {
        config.validate()?;

        match probe_primary(config).await {
            Ok(pool) => {
                let mode = StorageMode::Primary {
                    schema: config.schema.clone(),
                };
                info!(mode = %mode, "Connected to primary database");
                Ok(Self {
                    backend: Backend::Postgres(pool),
                    mode,
                })
            }
            Err(e) => {
                error!(error = %e, "Database connection failed");
                Self::fallback(&config.fallback_path).await
            }
        }
    }

    /// Provision the fallback store at `path`, destructively reseeding it.
    pub async fn fallback(path: &Path) -> AqResult<Self> {
        let mode = StorageMode::Fallback {
            path: path.to_path_buf(),
        };
        let pool = provision_fallback(path).await?;
        seed::bootstrap(&pool, &mode, Utc::now())
            .await
            .map_err(|e| match e {
                AqError::FallbackProvisioning(_) => e,
                other => AqError::FallbackProvisioning(other.to_string()),
            })?;

        warn!(
            path = %path.display(),
            "Falling back to built-in SQLite demo database"
        );

        Ok(Self {
            backend: Backend::Sqlite(pool),
            mode,
        })
    }

    pub fn mode(&self) -> &StorageMode {
        &self.mode
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Fully-qualified table name for the active mode.
    pub fn table_name(&self, logical_name: &str) -> String {
        self.mode.table_name(logical_name)
    }

    /// Open a transaction. Dropping the returned session without committing
    /// rolls it back.
    pub async fn begin(&self) -> AqResult<Session> {
        let session = match &self.backend {
            Backend::Postgres(pool) => pool.begin().await.map(Session::Postgres),
            Backend::Sqlite(pool) => pool.begin().await.map(Session::Sqlite),
        };
        session.map_err(|e| AqError::DatabaseError(format!("Begin failed: {}", e)))
    }

    /// Run one unit of work in its own transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    /// If the future panics or is dropped the session is dropped with it,
    /// which also rolls back.
    pub async fn with_session<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<AqError>,
    {
        let mut session = self.begin().await?;

        match work(&mut session).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Minimal round-trip against the bound store.
    pub async fn ping(&self) -> AqResult<()> {
        on_pool!(&self.backend, pool => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()))
            .map_err(|e| AqError::ServiceUnavailable(format!("Ping failed: {}", e)))
    }

    pub async fn close(&self) {
        on_pool!(&self.backend, pool => pool.close().await)
    }
}

/// Connect to the primary and issue `SELECT 1`.
async fn probe_primary(config: &StorageConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.probe_timeout)
        .connect(&config.database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Open (creating if needed) the SQLite file backing the fallback store.
async fn provision_fallback(path: &Path) -> AqResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AqError::FallbackProvisioning(format!(
                    "Cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            AqError::FallbackProvisioning(format!(
                "Failed to open SQLite database {}: {}",
                path.display(),
                e
            ))
        })
}
