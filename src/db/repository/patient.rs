use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, uuid, first_name, last_name, email, birth_date,
     address_line_1, address_line_2, address_city, zipcode, gender, phone,
     is_active, created_at";

/// Inserts a patient and returns the stored record with its assigned
/// `id` and `created_at`.
pub fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    // Stored at microsecond precision; truncate so the returned record
    // matches what a later read yields.
    let created_at = Utc::now().trunc_subsecs(6);

    conn.execute(
        "INSERT INTO patients (uuid, first_name, last_name, email, birth_date,
         address_line_1, address_line_2, address_city, zipcode, gender, phone,
         is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            new.uuid.map(|id| id.to_string()),
            new.first_name,
            new.last_name,
            new.email,
            new.birth_date.to_string(),
            new.address_line_1,
            new.address_line_2,
            new.address_city,
            new.zipcode,
            new.gender.as_str(),
            new.phone,
            new.is_active as i32,
            format_timestamp(&created_at),
        ],
    )?;

    let id = conn.last_insert_rowid();
    tracing::debug!(id, "Patient inserted");

    Ok(Patient {
        id,
        uuid: new.uuid,
        first_name: Some(new.first_name.clone()),
        last_name: Some(new.last_name.clone()),
        email: Some(new.email.clone()),
        birth_date: new.birth_date,
        address_line_1: Some(new.address_line_1.clone()),
        address_line_2: new.address_line_2.clone(),
        address_city: Some(new.address_city.clone()),
        zipcode: Some(new.zipcode.clone()),
        gender: Some(new.gender),
        phone: Some(new.phone.clone()),
        is_active: new.is_active,
        created_at,
    })
}

/// All patients, newest first. Rows sharing a timestamp fall back to
/// insertion order (higher id first). Rows whose stored values no longer
/// parse are skipped with a warning.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], PatientRow::read)?;

    let mut patients = Vec::new();
    for row in rows {
        let row = row?;
        let id = row.id;
        match row.into_patient() {
            Ok(patient) => patients.push(patient),
            Err(e) => tracing::warn!(id, error = %e, "Skipping unreadable patient row"),
        }
    }
    Ok(patients)
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id],
            PatientRow::read,
        )
        .optional()?;

    row.map(PatientRow::into_patient).transpose()
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

/// Fixed-width RFC 3339 so lexical order in SQLite matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

struct PatientRow {
    id: i64,
    uuid: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    birth_date: String,
    address_line_1: Option<String>,
    address_line_2: Option<String>,
    address_city: Option<String>,
    zipcode: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    is_active: i32,
    created_at: String,
}

impl PatientRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            birth_date: row.get(5)?,
            address_line_1: row.get(6)?,
            address_line_2: row.get(7)?,
            address_city: row.get(8)?,
            zipcode: row.get(9)?,
            gender: row.get(10)?,
            phone: row.get(11)?,
            is_active: row.get(12)?,
            created_at: row.get(13)?,
        })
    }

    fn into_patient(self) -> Result<Patient, DatabaseError> {
        let uuid = self
            .uuid
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid owner uuid: {e}")))?;
        let birth_date = NaiveDate::parse_from_str(&self.birth_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid birth date: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid created_at: {e}")))?;
        let gender = self.gender.as_deref().map(Gender::from_str).transpose()?;

        Ok(Patient {
            id: self.id,
            uuid,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            birth_date,
            address_line_1: self.address_line_1,
            address_line_2: self.address_line_2,
            address_city: self.address_city,
            zipcode: self.zipcode,
            gender,
            phone: self.phone,
            is_active: self.is_active != 0,
            created_at,
        })
    }
}
