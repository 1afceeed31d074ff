pub mod enums;
pub mod patient;

pub use enums::Gender;
pub use patient::{NewPatient, Patient, PatientCard};
