//! Domain types and wire payloads for the two record resources.
//!
//! Responsibilities:
//! - Define the stored shapes (`Patient`, `Observation`, `LogEntry`) that map
//!   directly onto table rows
//! - Define the wire payloads the API accepts, with external field names
//!   (`birthDate`) translated via serde renames
//! - Keep status-like columns as closed enums so illegal states are
//!   unrepresentable (`Gender`, `AuditAction`, `ResourceKind`)
//!
//! Payloads are untyped strings where the validation layer owns the rules
//! (gender set membership, date parsing and range); drafts are the validated
//! output the repositories accept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Closed enumerations
// ============================================================================

/// Administrative gender, constrained to the three-value set the store also
/// enforces via a CHECK constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parse from the case-sensitive wire form.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Kind of mutating action recorded in the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Put,
    Patch,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Put => "PUT",
            AuditAction::Patch => "PATCH",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// Resource kind an audit entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "PascalCase")]
pub enum ResourceKind {
    Patient,
    Observation,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::Observation => "Observation",
        }
    }
}

// ============================================================================
// Stored resources
// ============================================================================

/// A patient record as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Patient {
    pub id: String,
    pub family_name: String,
    pub given_name: String,
    pub gender: Gender,
    #[serde(rename = "birthDate")]
    pub birth_date: NaiveDate,
    pub medical_summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A clinical observation scoped to an existing patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Observation {
    pub id: String,
    pub patient_id: String,
    pub category: String,
    pub code: String,
    pub display: String,
    pub value: f64,
    pub unit: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// One append-only audit trail entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub resource: ResourceKind,
    pub resource_id: String,
}

/// One page of patients plus the listing metadata echoed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PatientPage {
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub data: Vec<Patient>,
}

// ============================================================================
// Wire payloads (pre-validation)
// ============================================================================

/// Full patient payload as submitted by the caller. All fields are required;
/// `medical_summary` may be empty.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientPayload {
    pub id: String,
    pub family_name: String,
    pub given_name: String,
    pub gender: String,
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    #[serde(default)]
    pub medical_summary: String,
}

/// Partial patient payload: only the fields present are validated and
/// applied.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PatientUpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(
        rename = "birthDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_summary: Option<String>,
}

/// Observation payload. Only type and date format are checked; descriptive
/// strings may be empty.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ObservationPayload {
    pub patient_id: String,
    pub category: String,
    pub code: String,
    pub display: String,
    pub value: f64,
    pub unit: String,
    pub date: String,
}

// ============================================================================
// Validated drafts
// ============================================================================

/// A fully validated patient, ready for insert or full replace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientDraft {
    pub id: String,
    pub family_name: String,
    pub given_name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub medical_summary: String,
}

/// Typed optional-field update descriptor for `patch`: the caller sets only
/// the fields it intends to change, and the repository maps each one to its
/// column deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientPatch {
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub medical_summary: Option<String>,
}

impl PatientPatch {
    /// True when no field is set; such a patch is rejected before any write.
    pub fn is_empty(&self) -> bool {
        self.family_name.is_none()
            && self.given_name.is_none()
            && self.gender.is_none()
            && self.birth_date.is_none()
            && self.medical_summary.is_none()
    }
}

/// A validated observation, ready for insert. The id is generated by the
/// repository at insert time.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationDraft {
    pub patient_id: String,
    pub category: String,
    pub code: String,
    pub display: String,
    pub value: f64,
    pub unit: String,
    pub date: NaiveDate,
}
