//! Add-patient submission state machine.
//!
//! `Idle → Validating → Submitting → (Success | Failed) → Idle`
//!
//! The `Idle → Submitting` transition happens under the lock before the
//! insert is awaited, so a second submit arriving meanwhile sees
//! `Submitting` and is ignored. The state machine is the only guard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::validation::{validate_form, FieldErrors, PatientForm};
use crate::backend::PatientBackend;
use crate::models::Patient;
use crate::store::PatientStore;

/// Generic notice shown when the backend rejects or drops an insert.
pub const INSERT_FAILED_NOTICE: &str = "Failed to add patient. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Success,
    /// Last submit failed validation; `field_errors` explains why.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Added(Patient),
    Invalid(FieldErrors),
    /// Backend insert failed; form kept for resubmission.
    InsertFailed,
    /// A submission was already in flight, or the dialog is closed.
    Ignored,
}

struct FormInner {
    state: FormState,
    form: PatientForm,
    field_errors: FieldErrors,
    notice: Option<String>,
    open: bool,
}

impl FormInner {
    fn reset(&mut self) {
        self.form = PatientForm::default();
        self.field_errors = FieldErrors::default();
        self.notice = None;
    }
}

pub struct AddPatientController {
    backend: Arc<dyn PatientBackend>,
    store: Arc<PatientStore>,
    inner: Mutex<FormInner>,
}

impl AddPatientController {
    pub fn new(backend: Arc<dyn PatientBackend>, store: Arc<PatientStore>) -> Self {
        Self {
            backend,
            store,
            inner: Mutex::new(FormInner {
                state: FormState::Idle,
                form: PatientForm::default(),
                field_errors: FieldErrors::default(),
                notice: None,
                open: false,
            }),
        }
    }

    /// Open the dialog with a blank form.
    pub fn open(&self) {
        let mut inner = self.lock();
        if inner.state == FormState::Submitting {
            return;
        }
        inner.reset();
        inner.state = FormState::Idle;
        inner.open = true;
    }

    /// Discard input and close. Inert while a submission is in flight.
    /// Returns whether the dialog was closed.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == FormState::Submitting {
            return false;
        }
        inner.reset();
        inner.state = FormState::Idle;
        inner.open = false;
        true
    }

    /// Validate `fields` and, if valid, insert exactly once.
    ///
    /// On success the form is cleared, the dialog closed and the store
    /// refreshed. Validation and insert failures leave the form populated
    /// and the dialog open. Ignored while the dialog is closed.
    pub async fn submit(&self, fields: PatientForm) -> SubmitOutcome {
        let new_patient = {
            let mut inner = self.lock();
            if inner.state == FormState::Submitting {
                tracing::debug!("Submit ignored: insert already in flight");
                return SubmitOutcome::Ignored;
            }
            if !inner.open {
                tracing::debug!("Submit ignored: dialog is closed");
                return SubmitOutcome::Ignored;
            }

            inner.form = fields;
            inner.notice = None;
            inner.state = FormState::Validating;

            match validate_form(&inner.form, self.backend.current_user_id()) {
                Ok(new_patient) => {
                    inner.field_errors = FieldErrors::default();
                    inner.state = FormState::Submitting;
                    new_patient
                }
                Err(errors) => {
                    tracing::debug!(fields = errors.len(), "Patient form failed validation");
                    inner.field_errors = errors.clone();
                    inner.state = FormState::Failed;
                    return SubmitOutcome::Invalid(errors);
                }
            }
        };

        match self.backend.insert_patient(new_patient).await {
            Ok(patient) => {
                {
                    let mut inner = self.lock();
                    inner.state = FormState::Success;
                    inner.reset();
                    inner.open = false;
                }
                tracing::info!(id = patient.id, "Patient added");

                self.store.refresh().await;

                // The dialog may have been reopened and resubmitted while
                // the refresh ran; leave that submission's state alone.
                let mut inner = self.lock();
                if inner.state == FormState::Success {
                    inner.state = FormState::Idle;
                }
                SubmitOutcome::Added(patient)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to insert patient");
                let mut inner = self.lock();
                inner.notice = Some(INSERT_FAILED_NOTICE.to_string());
                inner.state = FormState::Idle;
                SubmitOutcome::InsertFailed
            }
        }
    }

    pub fn state(&self) -> FormState {
        self.lock().state
    }

    pub fn is_submitting(&self) -> bool {
        self.state() == FormState::Submitting
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.lock().field_errors.clone()
    }

    pub fn notice(&self) -> Option<String> {
        self.lock().notice.clone()
    }

    pub fn form(&self) -> PatientForm {
        self.lock().form.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
