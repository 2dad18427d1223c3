//! Request handlers.
//!
//! Handlers stay thin: validate the payload against today's date, call the
//! repository, record the audit entry on success, shape the response. Audit
//! recording never fails the request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;

use fhirlite_core::{
    db, validation, AuditAction, LogEntry, Observation, ObservationPayload, Patient, PatientPage,
    PatientPayload, PatientUpdatePayload, ResourceKind,
};

use crate::dto::{
    DeleteRes, HealthRes, LimitParams, ObservationMutationRes, PageParams, PatientMutationRes,
    RootRes, SearchParams,
};
use crate::error::ApiError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = RootRes))
)]
pub async fn root() -> Json<RootRes> {
    Json(RootRes {
        service: "fhirlite".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        docs: "/swagger-ui".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health report with row counts", body = HealthRes))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    // Always 200: a degraded store is reported in the body, not the status.
    match db::row_counts(&state.pool).await {
        Ok(counts) => Json(HealthRes {
            status: "ok".into(),
            patients: counts.patients,
            observations: counts.observations,
            logs: counts.logs,
            error: None,
        }),
        Err(err) => {
            tracing::error!(error = %err, "health probe could not reach storage");
            Json(HealthRes {
                status: "degraded".into(),
                patients: 0,
                observations: 0,
                logs: 0,
                error: Some(err.to_string()),
            })
        }
    }
}

#[utoipa::path(
    post,
    path = "/fhir/Patient",
    request_body = PatientPayload,
    responses(
        (status = 201, description = "Patient created", body = PatientMutationRes),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Patient id already exists"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn create_patient(
    State(state): State<AppState>,
    Json(payload): Json<PatientPayload>,
) -> Result<(StatusCode, Json<PatientMutationRes>), ApiError> {
    let draft = validation::validate_patient(&payload, Utc::now().date_naive())?;
    let patient = state.patients.create(&draft).await?;
    state
        .audit
        .record(AuditAction::Create, ResourceKind::Patient, &patient.id)
        .await;
    Ok((
        StatusCode::CREATED,
        Json(PatientMutationRes {
            message: format!("patient '{}' created", patient.id),
            patient,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/fhir/Patient",
    params(PageParams),
    responses(
        (status = 200, description = "One page of patients", body = PatientPage),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PatientPage>, ApiError> {
    let page = state.patients.list(params.page, params.size).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/fhir/Patient/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Patients matching the name fragment", body = [Patient]),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let hits = state.patients.search(&params.name).await?;
    Ok(Json(hits))
}

#[utoipa::path(
    get,
    path = "/fhir/Patient/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "The patient", body = Patient),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn read_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.patients.fetch(&id).await?))
}

#[utoipa::path(
    put,
    path = "/fhir/Patient/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientPayload,
    responses(
        (status = 200, description = "Patient replaced", body = PatientMutationRes),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn replace_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<PatientPayload>,
) -> Result<Json<PatientMutationRes>, ApiError> {
    // The path owns the identity; any id in the body is ignored.
    payload.id = id.clone();
    let draft = validation::validate_patient(&payload, Utc::now().date_naive())?;
    let patient = state.patients.replace(&id, &draft).await?;
    state
        .audit
        .record(AuditAction::Put, ResourceKind::Patient, &id)
        .await;
    Ok(Json(PatientMutationRes {
        message: format!("patient '{id}' replaced"),
        patient,
    }))
}

#[utoipa::path(
    patch,
    path = "/fhir/Patient/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientUpdatePayload,
    responses(
        (status = 200, description = "Patient updated", body = PatientMutationRes),
        (status = 400, description = "Validation failure or empty update"),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PatientUpdatePayload>,
) -> Result<Json<PatientMutationRes>, ApiError> {
    let patch = validation::validate_patient_update(&payload, Utc::now().date_naive())?;
    let patient = state.patients.patch(&id, &patch).await?;
    state
        .audit
        .record(AuditAction::Patch, ResourceKind::Patient, &id)
        .await;
    Ok(Json(PatientMutationRes {
        message: format!("patient '{id}' updated"),
        patient,
    }))
}

#[utoipa::path(
    delete,
    path = "/fhir/Patient/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient and their observations deleted", body = DeleteRes),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRes>, ApiError> {
    let observations_removed = state.patients.delete(&id).await?;
    state
        .audit
        .record(AuditAction::Delete, ResourceKind::Patient, &id)
        .await;
    Ok(Json(DeleteRes {
        message: format!("patient '{id}' deleted"),
        deleted: id,
        observations_removed,
    }))
}

#[utoipa::path(
    post,
    path = "/fhir/Observation",
    request_body = ObservationPayload,
    responses(
        (status = 201, description = "Observation created", body = ObservationMutationRes),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn create_observation(
    State(state): State<AppState>,
    Json(payload): Json<ObservationPayload>,
) -> Result<(StatusCode, Json<ObservationMutationRes>), ApiError> {
    let draft = validation::validate_observation(&payload)?;
    let observation = state.observations.create(&draft).await?;
    state
        .audit
        .record(
            AuditAction::Create,
            ResourceKind::Observation,
            &observation.id,
        )
        .await;
    Ok((
        StatusCode::CREATED,
        Json(ObservationMutationRes {
            message: "observation created".into(),
            observation,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/fhir/Observation/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "The patient's observations, newest first", body = [Observation]),
        (status = 404, description = "No such patient"),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn list_observations(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    Ok(Json(state.observations.list_for_patient(&patient_id).await?))
}

#[utoipa::path(
    get,
    path = "/logs",
    params(LimitParams),
    responses(
        (status = 200, description = "Recent audit entries, newest first", body = [LogEntry]),
        (status = 401, description = "Invalid or missing API key")
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    Ok(Json(state.audit.recent(params.limit).await?))
}
