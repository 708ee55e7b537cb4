//! Transaction-scoped units of work.

use sqlx::{Postgres, Sqlite, Transaction};

use aq_common::{AqError, AqResult};

/// One open transaction on whichever store the adapter is bound to.
///
/// Dropping a session without calling [`Session::commit`] rolls it back and
/// returns the connection to its pool.
pub enum Session {
    Postgres(Transaction<'static, Postgres>),
    Sqlite(Transaction<'static, Sqlite>),
}

/// Run the same sqlx expression against the session's concrete connection.
///
/// `$conn` is bound to `&mut PgConnection` or `&mut SqliteConnection`; reborrow
/// it (`&mut *conn`) for each statement.
macro_rules! on_session {
    ($session:expr, $conn:ident => $body:expr) => {
        match $session {
            $crate::session::Session::Postgres(tx) => {
                let $conn = &mut **tx;
                $body
            }
            $crate::session::Session::Sqlite(tx) => {
                let $conn = &mut **tx;
                $body
            }
        }
    };
}
pub(crate) use on_session;

impl Session {
    pub async fn commit(self) -> AqResult<()> {
        match self {
            Session::Postgres(tx) => tx.commit().await,
            Session::Sqlite(tx) => tx.commit().await,
        }
        .map_err(|e| AqError::DatabaseError(format!("Commit failed: {}", e)))
    }

    pub async fn rollback(self) -> AqResult<()> {
        match self {
            Session::Postgres(tx) => tx.rollback().await,
            Session::Sqlite(tx) => tx.rollback().await,
        }
        .map_err(|e| AqError::DatabaseError(format!("Rollback failed: {}", e)))
    }

    /// Execute a statement with no bind parameters inside this session.
    pub async fn execute_raw(&mut self, sql: &str) -> AqResult<u64> {
        let result = on_session!(self, conn => sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map(|r| r.rows_affected()));

        result.map_err(|e| AqError::DatabaseError(format!("Statement failed: {}", e)))
    }
}
