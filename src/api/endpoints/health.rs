//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub patient_count: i64,
    pub schema_version: i64,
    pub started_at: String,
}

/// `GET /api/health` — connection check; also proves the database answers.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let (patient_count, schema_version) = {
        let conn = ctx.core.lock_db()?;
        (db::count_patients(&conn)?, db::schema_version(&conn))
    };

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        patient_count,
        schema_version,
        started_at: ctx.core.started_at.to_rfc3339(),
    }))
}
