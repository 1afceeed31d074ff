use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Gender;

/// A persisted patient record.
///
/// `id` and `created_at` are assigned by the backend on insert and never
/// change afterwards. Name fields are optional; see [`Patient::full_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    /// Owner reference: the user who created the record.
    pub uuid: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub address_city: Option<String>,
    pub zipcode: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// First and last name joined by a space and trimmed. Empty when both
    /// name fields are absent.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    /// Upper-cased first letter of each name part.
    pub fn initials(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Whole years elapsed between `birth_date` and `today`.
    /// `None` when the birth date lies after `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        today.years_since(self.birth_date)
    }

    /// Age as of the local calendar date.
    pub fn age(&self) -> Option<u32> {
        self.age_on(Local::now().date_naive())
    }

    /// Summary shown for each patient in the list.
    pub fn card(&self) -> PatientCard {
        self.card_on(Local::now().date_naive())
    }

    pub fn card_on(&self, today: NaiveDate) -> PatientCard {
        PatientCard {
            id: self.id,
            full_name: self.full_name(),
            initials: self.initials(),
            age: self.age_on(today),
            email: self.email.clone(),
            gender: self.gender,
            phone: self.phone.clone(),
            city: self.address_city.clone(),
        }
    }
}

/// List-view projection of a [`Patient`]. Derived values are computed at
/// projection time and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCard {
    pub id: i64,
    pub full_name: String,
    pub initials: String,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// Insert payload: validated intake fields plus owner and active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub uuid: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub address_city: String,
    pub zipcode: String,
    pub gender: Gender,
    pub is_active: bool,
}
