//! Patient endpoints.
//!
//! - `GET /api/patients?q=` — newest first, optionally filtered
//! - `GET /api/patients/:id` — one patient
//! - `POST /api/patients` — validate the intake form and insert

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::add_patient::{validate_form, PatientForm};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, RequestIdentity};
use crate::db;
use crate::models::Patient;
use crate::search::filter_patients;

#[derive(Debug, Default, Deserialize)]
pub struct PatientListQuery {
    pub q: Option<String>,
}

/// `GET /api/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = {
        let conn = ctx.core.lock_db()?;
        db::list_patients(&conn)?
    };

    let patients = match query.q.as_deref() {
        Some(q) => filter_patients(&patients, q),
        None => patients,
    };
    Ok(Json(patients))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid patient ID".into()))?;

    let conn = ctx.core.lock_db()?;
    db::get_patient(&conn, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient {id} not found")))
}

/// `POST /api/patients` — 201 with the stored record, 400 with a field map.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<RequestIdentity>,
    Json(form): Json<PatientForm>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let new_patient = validate_form(&form, identity.user_id).map_err(ApiError::Validation)?;

    let patient = {
        let conn = ctx.core.lock_db()?;
        db::insert_patient(&conn, &new_patient)?
    };

    tracing::info!(id = patient.id, "Patient created via API");
    Ok((StatusCode::CREATED, Json(patient)))
}
