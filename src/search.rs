//! Patient search — substring match over display name and email.
//!
//! Pure and order-preserving: the visible list is always recomputed from the
//! full collection and the current query, never patched incrementally.

use crate::models::Patient;

/// Returns the patients matching `query`, in their original order.
///
/// An empty query returns the input unchanged. Otherwise a patient matches
/// when its lower-cased full name or lower-cased email contains the
/// lower-cased query. Patients without an email only match on name.
pub fn filter_patients(patients: &[Patient], query: &str) -> Vec<Patient> {
    if query.is_empty() {
        return patients.to_vec();
    }

    let needle = query.to_lowercase();
    patients
        .iter()
        .filter(|patient| matches_query(patient, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lower-cased.
fn matches_query(patient: &Patient, needle: &str) -> bool {
    if patient.full_name().to_lowercase().contains(needle) {
        return true;
    }
    patient
        .email
        .as_deref()
        .is_some_and(|email| email.to_lowercase().contains(needle))
}
