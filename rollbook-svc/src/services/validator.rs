//! Per-row schema validation
//!
//! Pure functions: no storage access, no side effects. Every rule is
//! evaluated (no short-circuiting) so a row surfaces all of its
//! problems at once, each tagged with the originating row number.

use crate::models::{Gender, RawRecord, ValidationError, VoterCandidate};

const AGE_MIN: i64 = 18;
const AGE_MAX: i64 = 120;

/// Validate one parsed row
///
/// The candidate is always returned, even with errors, because draft
/// mode persists incomplete rows. A row is "valid" when the error list
/// is empty.
pub fn validate(raw: &RawRecord) -> (VoterCandidate, Vec<ValidationError>) {
    let row = raw.row_number;
    let mut errors = Vec::new();

    let voter_id = raw.voter_id.clone().unwrap_or_default();
    if voter_id.is_empty() {
        errors.push(ValidationError {
            row,
            field: "VoterID".to_string(),
            message: "Voter ID is required".to_string(),
        });
    }

    // Phone arrives digits-only from the parser; re-strip to keep this
    // function safe on hand-built input as well
    let phone_number: String = raw
        .phone_number
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if phone_number.is_empty() {
        errors.push(ValidationError {
            row,
            field: "PhoneNumber".to_string(),
            message: "Phone number is required".to_string(),
        });
    } else if phone_number.len() != 10 {
        errors.push(ValidationError {
            row,
            field: "PhoneNumber".to_string(),
            message: "Phone number must be exactly 10 digits".to_string(),
        });
    }

    let name = raw.name.clone().unwrap_or_default();
    if name.is_empty() {
        errors.push(ValidationError {
            row,
            field: "Name".to_string(),
            message: "Name is required".to_string(),
        });
    }

    let gender = match raw.gender.as_deref() {
        None => None,
        Some(value) => match Gender::parse_str(value) {
            Some(gender) => Some(gender),
            None => {
                errors.push(ValidationError {
                    row,
                    field: "Gender".to_string(),
                    message: "Gender must be Male, Female, or Other".to_string(),
                });
                None
            }
        },
    };

    let age = match raw.age.as_deref() {
        None => None,
        Some(value) => match value.parse::<i64>() {
            Ok(age) if (AGE_MIN..=AGE_MAX).contains(&age) => Some(age),
            _ => {
                errors.push(ValidationError {
                    row,
                    field: "Age".to_string(),
                    message: "Age must be between 18 and 120".to_string(),
                });
                None
            }
        },
    };

    let candidate = VoterCandidate {
        row_number: row,
        voter_id,
        phone_number,
        surname: raw.surname.clone(),
        name,
        father_husband_name: raw.father_husband_name.clone(),
        gender,
        age,
        qualification: raw.qualification.clone(),
        caste: raw.caste.clone(),
        sub_caste: raw.sub_caste.clone(),
        pc: raw.pc.clone(),
        ac: raw.ac.clone(),
        mandal_ward_division: raw.mandal_ward_division.clone(),
        panchayat_name: raw.panchayat_name.clone(),
        village_name: raw.village_name.clone(),
        booth: raw.booth.clone(),
    };

    (candidate, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawRecord {
        RawRecord {
            row_number: 2,
            voter_id: Some("ABC1234567".to_string()),
            phone_number: Some("9876543210".to_string()),
            name: Some("Lakshmi".to_string()),
            surname: Some("Devi".to_string()),
            gender: Some("Female".to_string()),
            age: Some("34".to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn valid_row_yields_no_errors() {
        let (candidate, errors) = validate(&valid_raw());
        assert!(errors.is_empty());
        assert_eq!(candidate.phone_number, "9876543210");
        assert_eq!(candidate.gender, Some(Gender::Female));
        assert_eq!(candidate.age, Some(34));
    }

    #[test]
    fn errors_accumulate_instead_of_short_circuiting() {
        let raw = RawRecord {
            row_number: 7,
            voter_id: None,
            phone_number: None,
            name: None,
            gender: Some("male".to_string()),
            age: Some("nine".to_string()),
            ..RawRecord::default()
        };

        let (_, errors) = validate(&raw);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["VoterID", "PhoneNumber", "Name", "Gender", "Age"]
        );
        assert!(errors.iter().all(|e| e.row == 7));
    }

    #[test]
    fn phone_number_is_normalized_to_digits() {
        let mut raw = valid_raw();
        raw.phone_number = Some("98-76 543210".to_string());
        let (candidate, errors) = validate(&raw);
        assert!(errors.is_empty());
        assert_eq!(candidate.phone_number, "9876543210");
    }

    #[test]
    fn nine_digit_phone_fails() {
        let mut raw = valid_raw();
        raw.phone_number = Some("987654321".to_string());
        let (_, errors) = validate(&raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "PhoneNumber");
        assert_eq!(errors[0].message, "Phone number must be exactly 10 digits");
    }

    #[test]
    fn empty_phone_after_stripping_reports_required() {
        let mut raw = valid_raw();
        raw.phone_number = Some("--- ---".to_string());
        let (_, errors) = validate(&raw);
        assert_eq!(errors[0].message, "Phone number is required");
    }

    #[test]
    fn age_bounds_are_inclusive() {
        for (age, ok) in [("17", false), ("18", true), ("120", true), ("121", false)] {
            let mut raw = valid_raw();
            raw.age = Some(age.to_string());
            let (_, errors) = validate(&raw);
            assert_eq!(errors.is_empty(), ok, "age {}", age);
        }
    }

    #[test]
    fn absent_age_and_gender_are_fine() {
        let mut raw = valid_raw();
        raw.age = None;
        raw.gender = None;
        let (candidate, errors) = validate(&raw);
        assert!(errors.is_empty());
        assert_eq!(candidate.age, None);
        assert_eq!(candidate.gender, None);
    }

    #[test]
    fn gender_enum_is_exact() {
        let mut raw = valid_raw();
        raw.gender = Some("F".to_string());
        let (_, errors) = validate(&raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Gender must be Male, Female, or Other");
    }
}
