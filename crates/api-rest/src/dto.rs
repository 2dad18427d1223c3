//! Response and query-parameter shapes owned by the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use fhirlite_core::{Observation, Patient};

/// Service banner returned at the root path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootRes {
    pub service: String,
    pub version: String,
    pub docs: String,
}

/// Health report: storage reachability plus row counts per table.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub patients: i64,
    pub observations: i64,
    pub logs: i64,
    /// Present only when storage is unreachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a patient mutation: a short message plus the stored record.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientMutationRes {
    pub message: String,
    #[serde(flatten)]
    pub patient: Patient,
}

/// Outcome of an observation create.
#[derive(Debug, Serialize, ToSchema)]
pub struct ObservationMutationRes {
    pub message: String,
    #[serde(flatten)]
    pub observation: Observation,
}

/// Outcome of a patient delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub message: String,
    pub deleted: String,
    pub observations_removed: u64,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    10
}

/// Pagination query parameters for the patient listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Rows per page, clamped server-side.
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Query parameters for the name search.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against family and given names.
    #[serde(default)]
    pub name: String,
}

fn default_limit() -> u32 {
    100
}

/// Query parameters for the audit trail listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}
