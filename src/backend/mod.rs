//! Patient backend contract and its implementations.
//!
//! The store and the intake controller only see [`PatientBackend`]:
//! - [`SqliteBackend`]: in-process, backed by the shared `CoreState` database
//! - [`HttpBackend`]: remote, talks to the JSON API served by `crate::api`

pub mod http;
pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient};

pub use http::HttpBackend;
pub use sqlite::SqliteBackend;

/// Errors from backend calls (fetch or insert).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Lock poisoned")]
    LockPoisoned,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Http(e.to_string())
    }
}

impl From<CoreError> for BackendError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::LockPoisoned => BackendError::LockPoisoned,
            CoreError::Database(e) => BackendError::Database(e),
        }
    }
}

/// Data source for patients.
#[async_trait]
pub trait PatientBackend: Send + Sync {
    /// Full collection, newest `created_at` first.
    async fn list_patients(&self) -> Result<Vec<Patient>, BackendError>;

    /// Single atomic insert; returns the stored record.
    async fn insert_patient(&self, patient: NewPatient) -> Result<Patient, BackendError>;

    /// Identity stamped as the owner of new records.
    fn current_user_id(&self) -> Option<Uuid>;
}
