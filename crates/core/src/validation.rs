//! Payload validation.
//!
//! Pure functions, no I/O: every rule here runs before any repository call,
//! so a rejected request never reaches the store. Errors name the offending
//! field using its externally visible name (`birthDate`, not `birth_date`).

use chrono::NaiveDate;

use crate::error::{RecordError, RecordResult};
use crate::model::{
    Gender, ObservationDraft, ObservationPayload, PatientDraft, PatientPatch, PatientPayload,
    PatientUpdatePayload,
};

/// Earliest accepted birth date.
fn min_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("constant date is valid")
}

/// Validate a gender value against the closed, case-sensitive set.
pub fn validate_gender(value: &str) -> RecordResult<Gender> {
    Gender::from_wire(value).ok_or_else(|| RecordError::InvalidField {
        field: "gender",
        message: format!("must be 'male', 'female' or 'other', got '{value}'"),
    })
}

/// Validate a birth date string.
///
/// A string that does not parse as an ISO calendar date yields
/// [`RecordError::MalformedField`]; a date outside `[1900-01-01, today]`
/// yields [`RecordError::InvalidField`]. `today` is passed in so the
/// boundary is fixed at validation time (and testable).
pub fn validate_birth_date(value: &str, today: NaiveDate) -> RecordResult<NaiveDate> {
    let parsed =
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| RecordError::MalformedField {
            field: "birthDate",
            message: format!("expected an ISO calendar date (YYYY-MM-DD): {e}"),
        })?;

    if parsed < min_birth_date() || parsed > today {
        return Err(RecordError::InvalidField {
            field: "birthDate",
            message: format!("must lie between 1900-01-01 and {today}"),
        });
    }

    Ok(parsed)
}

fn require_non_empty(field: &'static str, value: &str) -> RecordResult<()> {
    if value.is_empty() {
        return Err(RecordError::InvalidField {
            field,
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

/// Validate a full patient payload into a draft ready for create/replace.
pub fn validate_patient(payload: &PatientPayload, today: NaiveDate) -> RecordResult<PatientDraft> {
    require_non_empty("id", &payload.id)?;
    require_non_empty("family_name", &payload.family_name)?;
    require_non_empty("given_name", &payload.given_name)?;
    let gender = validate_gender(&payload.gender)?;
    let birth_date = validate_birth_date(&payload.birth_date, today)?;

    Ok(PatientDraft {
        id: payload.id.clone(),
        family_name: payload.family_name.clone(),
        given_name: payload.given_name.clone(),
        gender,
        birth_date,
        medical_summary: payload.medical_summary.clone(),
    })
}

/// Validate a partial patient payload into a typed update descriptor.
///
/// Only fields present in the payload are validated; an all-absent payload
/// produces an empty patch, which the repository rejects before writing.
pub fn validate_patient_update(
    payload: &PatientUpdatePayload,
    today: NaiveDate,
) -> RecordResult<PatientPatch> {
    if let Some(family_name) = &payload.family_name {
        require_non_empty("family_name", family_name)?;
    }
    if let Some(given_name) = &payload.given_name {
        require_non_empty("given_name", given_name)?;
    }

    let gender = payload
        .gender
        .as_deref()
        .map(validate_gender)
        .transpose()?;
    let birth_date = payload
        .birth_date
        .as_deref()
        .map(|v| validate_birth_date(v, today))
        .transpose()?;

    Ok(PatientPatch {
        family_name: payload.family_name.clone(),
        given_name: payload.given_name.clone(),
        gender,
        birth_date,
        medical_summary: payload.medical_summary.clone(),
    })
}

/// Validate an observation payload. Only the date format is checked here;
/// descriptive strings are deliberately allowed to be empty and the value is
/// already structurally numeric.
pub fn validate_observation(payload: &ObservationPayload) -> RecordResult<ObservationDraft> {
    let date =
        NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d").map_err(|e| {
            RecordError::MalformedField {
                field: "date",
                message: format!("expected an ISO calendar date (YYYY-MM-DD): {e}"),
            }
        })?;

    Ok(ObservationDraft {
        patient_id: payload.patient_id.clone(),
        category: payload.category.clone(),
        code: payload.code.clone(),
        display: payload.display.clone(),
        value: payload.value,
        unit: payload.unit.clone(),
        date,
    })
}
