//! API endpoint handlers.
//!
//! Each handler takes `State<ApiContext>` and delegates to the patient
//! repository, validation and search modules.

pub mod health;
pub mod patients;
