use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{BackendError, PatientBackend};
use crate::core_state::CoreState;
use crate::db;
use crate::models::{NewPatient, Patient};

/// In-process backend over the shared database.
pub struct SqliteBackend {
    core: Arc<CoreState>,
    user_id: Option<Uuid>,
}

impl SqliteBackend {
    pub fn new(core: Arc<CoreState>, user_id: Option<Uuid>) -> Self {
        Self { core, user_id }
    }
}

#[async_trait]
impl PatientBackend for SqliteBackend {
    async fn list_patients(&self) -> Result<Vec<Patient>, BackendError> {
        let conn = self.core.lock_db()?;
        Ok(db::list_patients(&conn)?)
    }

    async fn insert_patient(&self, patient: NewPatient) -> Result<Patient, BackendError> {
        let conn = self.core.lock_db()?;
        Ok(db::insert_patient(&conn, &patient)?)
    }

    fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }
}
