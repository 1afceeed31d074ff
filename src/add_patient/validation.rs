use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Gender, NewPatient};

/// Minimum phone length, in characters.
pub const PHONE_MIN_CHARS: usize = 10;

/// Minimum ZIP code length, in characters.
pub const ZIPCODE_MIN_CHARS: usize = 4;

/// Local part of dot-separated atoms (no leading, trailing or doubled
/// dots), then a dotted domain ending in an alphabetic TLD.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(?:\.[A-Za-z0-9_'+\-]+)*@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("email pattern compiles")
});

/// Raw intake form as typed by the user. Every field is free text until
/// validated; missing JSON fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub email: String,
    pub phone: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub address_city: String,
    pub zipcode: String,
    pub gender: String,
}

impl From<&NewPatient> for PatientForm {
    fn from(p: &NewPatient) -> Self {
        Self {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            birth_date: p.birth_date.format("%Y-%m-%d").to_string(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            address_line_1: p.address_line_1.clone(),
            address_line_2: p.address_line_2.clone().unwrap_or_default(),
            address_city: p.address_city.clone(),
            zipcode: p.zipcode.clone(),
            gender: p.gender.as_str().to_string(),
        }
    }
}

/// Validated intake fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    FirstName,
    LastName,
    BirthDate,
    Email,
    Phone,
    #[serde(rename = "address_line_1")]
    AddressLine1,
    AddressCity,
    Zipcode,
    Gender,
}

/// Per-field validation messages, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// First message wins; later rules on the same field are skipped.
    fn add(&mut self, field: FormField, message: &str) {
        self.0.entry(field).or_insert_with(|| message.to_string());
    }
}

/// Apply the intake schema to `form`.
///
/// On success returns the insert payload stamped with `owner` and
/// `is_active = true`. Text values are trimmed; an empty second address
/// line becomes `None`.
pub fn validate_form(form: &PatientForm, owner: Option<Uuid>) -> Result<NewPatient, FieldErrors> {
    let mut errors = FieldErrors::default();

    let first_name = form.first_name.trim();
    if first_name.is_empty() {
        errors.add(FormField::FirstName, "First name is required");
    }

    let last_name = form.last_name.trim();
    if last_name.is_empty() {
        errors.add(FormField::LastName, "Last name is required");
    }

    let birth_raw = form.birth_date.trim();
    let birth_date = if birth_raw.is_empty() {
        errors.add(FormField::BirthDate, "Birth date is required");
        None
    } else {
        let parsed = NaiveDate::parse_from_str(birth_raw, "%Y-%m-%d").ok();
        if parsed.is_none() {
            errors.add(
                FormField::BirthDate,
                "Birth date must be a valid date (YYYY-MM-DD)",
            );
        }
        parsed
    };

    let email = form.email.trim();
    if !EMAIL_PATTERN.is_match(email) {
        errors.add(FormField::Email, "Invalid email address");
    }

    let phone = form.phone.trim();
    if phone.chars().count() < PHONE_MIN_CHARS {
        errors.add(FormField::Phone, "Phone number must be at least 10 digits");
    }

    let address_line_1 = form.address_line_1.trim();
    if address_line_1.is_empty() {
        errors.add(FormField::AddressLine1, "Address line 1 is required");
    }

    let address_city = form.address_city.trim();
    if address_city.is_empty() {
        errors.add(FormField::AddressCity, "City is required");
    }

    let zipcode = form.zipcode.trim();
    if zipcode.chars().count() < ZIPCODE_MIN_CHARS {
        errors.add(FormField::Zipcode, "ZIP code is required");
    }

    let gender_raw = form.gender.trim();
    let gender = if gender_raw.is_empty() {
        errors.add(FormField::Gender, "Gender is required");
        None
    } else {
        let parsed = Gender::from_str(gender_raw).ok();
        if parsed.is_none() {
            errors.add(FormField::Gender, "Gender must be Male, Female or Other");
        }
        parsed
    };

    let (Some(birth_date), Some(gender), true) = (birth_date, gender, errors.is_empty()) else {
        return Err(errors);
    };

    let address_line_2 = Some(form.address_line_2.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string);

    Ok(NewPatient {
        uuid: owner,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        birth_date,
        phone: phone.to_string(),
        address_line_1: address_line_1.to_string(),
        address_line_2,
        address_city: address_city.to_string(),
        zipcode: zipcode.to_string(),
        gender,
        is_active: true,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_form() -> PatientForm {
        PatientForm {
            first_name: "Test".into(),
            last_name: "Patient".into(),
            birth_date: "1990-01-01".into(),
            email: "test.patient@example.com".into(),
            phone: "555-123-4567".into(),
            address_line_1: "123 Test Street".into(),
            address_line_2: String::new(),
            address_city: "Test City".into(),
            zipcode: "12345".into(),
            gender: "Male".into(),
        }
    }

    #[test]
    fn valid_form_produces_payload() {
        let owner = Uuid::new_v4();
        let patient = validate_form(&valid_form(), Some(owner)).unwrap();
        assert_eq!(patient.uuid, Some(owner));
        assert!(patient.is_active);
        assert_eq!(patient.gender, Gender::Male);
        assert_eq!(patient.birth_date, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(patient.address_line_2, None);
    }

    #[test]
    fn empty_form_flags_every_required_field() {
        let errors = validate_form(&PatientForm::default(), None).unwrap_err();
        for field in [
            FormField::FirstName,
            FormField::LastName,
            FormField::BirthDate,
            FormField::Email,
            FormField::Phone,
            FormField::AddressLine1,
            FormField::AddressCity,
            FormField::Zipcode,
            FormField::Gender,
        ] {
            assert!(errors.contains(field), "missing error for {field:?}");
        }
        assert_eq!(errors.len(), 9);
    }

    #[test]
    fn empty_form_messages_match_product_copy() {
        let errors = validate_form(&PatientForm::default(), None).unwrap_err();
        assert_eq!(errors.get(FormField::FirstName), Some("First name is required"));
        assert_eq!(errors.get(FormField::BirthDate), Some("Birth date is required"));
        assert_eq!(errors.get(FormField::Email), Some("Invalid email address"));
        assert_eq!(
            errors.get(FormField::Phone),
            Some("Phone number must be at least 10 digits")
        );
        assert_eq!(errors.get(FormField::AddressCity), Some("City is required"));
        assert_eq!(errors.get(FormField::Zipcode), Some("ZIP code is required"));
        assert_eq!(errors.get(FormField::Gender), Some("Gender is required"));
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let mut form = valid_form();
        form.first_name = "   ".into();
        let errors = validate_form(&form, None).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(FormField::FirstName));
    }

    #[test]
    fn address_line_2_is_optional_and_kept_when_present() {
        let mut form = valid_form();
        form.address_line_2 = " Apartment 12 ".into();
        let patient = validate_form(&form, None).unwrap();
        assert_eq!(patient.address_line_2.as_deref(), Some("Apartment 12"));
    }

    #[test]
    fn email_shapes() {
        for good in [
            "chamari.atapattu@gmail.com",
            "kusal+test@cricket.lk",
            "a_b@sub.domain.org",
        ] {
            let mut form = valid_form();
            form.email = good.into();
            assert!(validate_form(&form, None).is_ok(), "{good} should pass");
        }
        for bad in [
            "plainaddress",
            "@missing-local.com",
            "missing-at.com",
            "two@@signs.com",
            ".leading@dot.com",
            "double..dot@x.com",
            "no-tld@domain",
            "space in@mail.com",
        ] {
            let mut form = valid_form();
            form.email = bad.into();
            let errors = validate_form(&form, None).unwrap_err();
            assert!(errors.contains(FormField::Email), "{bad} should fail");
        }
    }

    #[test]
    fn phone_requires_ten_characters() {
        let mut form = valid_form();
        form.phone = "123456789".into();
        assert!(validate_form(&form, None).unwrap_err().contains(FormField::Phone));

        form.phone = "1234567890".into();
        assert!(validate_form(&form, None).is_ok());
    }

    #[test]
    fn zipcode_requires_four_characters() {
        let mut form = valid_form();
        form.zipcode = "123".into();
        assert!(validate_form(&form, None).unwrap_err().contains(FormField::Zipcode));

        form.zipcode = "1234".into();
        assert!(validate_form(&form, None).is_ok());
    }

    #[test]
    fn gender_outside_set_rejected() {
        let mut form = valid_form();
        form.gender = "Unknown".into();
        let errors = validate_form(&form, None).unwrap_err();
        assert_eq!(
            errors.get(FormField::Gender),
            Some("Gender must be Male, Female or Other")
        );
    }

    #[test]
    fn every_gender_option_accepted() {
        for gender in Gender::ALL {
            let mut form = valid_form();
            form.gender = gender.as_str().into();
            assert_eq!(validate_form(&form, None).unwrap().gender, *gender);
        }
    }

    #[test]
    fn malformed_birth_date_rejected() {
        let mut form = valid_form();
        form.birth_date = "01/02/1990".into();
        let errors = validate_form(&form, None).unwrap_err();
        assert_eq!(
            errors.get(FormField::BirthDate),
            Some("Birth date must be a valid date (YYYY-MM-DD)")
        );
    }

    #[test]
    fn form_round_trips_from_payload() {
        let patient = validate_form(&valid_form(), None).unwrap();
        let form = PatientForm::from(&patient);
        assert_eq!(form, valid_form());
    }

    #[test]
    fn partial_json_fills_missing_fields() {
        let form: PatientForm = serde_json::from_str(r#"{"first_name":"Kusal"}"#).unwrap();
        assert_eq!(form.first_name, "Kusal");
        assert!(form.email.is_empty());
    }

    #[test]
    fn field_errors_serialize_by_field_name() {
        let errors = validate_form(&PatientForm::default(), None).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["first_name"], "First name is required");
        assert_eq!(json["address_line_1"], "Address line 1 is required");
    }
}
