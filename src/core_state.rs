//! Transport-agnostic application state.
//!
//! `CoreState` owns the patient database connection and is shared between
//! the HTTP API and the in-process backend. Wrapped in `Arc` at startup.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{self, DatabaseError};

/// Shared state behind every transport.
pub struct CoreState {
    /// Single connection; SQLite serialises writers anyway.
    db: Mutex<Connection>,
    /// On-disk location, `None` for in-memory databases.
    database_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
}

impl CoreState {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Patient database opened");
        Ok(Self::with_connection(conn, Some(path.to_path_buf())))
    }

    /// In-memory database (for testing).
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self::with_connection(conn, None))
    }

    fn with_connection(conn: Connection, database_path: Option<PathBuf>) -> Self {
        Self {
            db: Mutex::new(conn),
            database_path,
            started_at: Utc::now(),
        }
    }

    /// Lock the connection for the duration of one unit of work.
    /// Never hold the guard across an `.await`.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }
}

/// Errors from core state operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Lock poisoned")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_state_has_no_path() {
        let core = CoreState::in_memory().unwrap();
        assert!(core.database_path().is_none());
        let conn = core.lock_db().unwrap();
        assert_eq!(db::count_patients(&conn).unwrap(), 0);
    }

    #[test]
    fn open_on_disk_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.db");
        let core = CoreState::open(&path).unwrap();
        assert_eq!(core.database_path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn core_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreState>();
    }
}
