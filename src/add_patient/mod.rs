//! Add-patient intake: form schema validation and the submission
//! controller that inserts a patient and refreshes the store.

pub mod controller;
pub mod validation;

pub use controller::{AddPatientController, FormState, SubmitOutcome, INSERT_FAILED_NOTICE};
pub use validation::{validate_form, FieldErrors, FormField, PatientForm};
