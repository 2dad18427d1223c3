//! REST surface for the fhirlite record server.
//!
//! Exposes the FHIR-flavoured patient and observation endpoints, the audit
//! trail, and the OpenAPI document with Swagger UI. The domain logic lives in
//! `fhirlite-core`; this crate owns routing, authentication and response
//! shaping.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use sqlx::sqlite::SqlitePool;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fhirlite_core::{db, AuditLog, ObservationRepository, PatientRepository};

pub use config::ApiConfig;
pub use error::ApiError;

/// Shared per-request state: the repositories, the pool for health probes,
/// and the API key.
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientRepository,
    pub observations: ObservationRepository,
    pub audit: AuditLog,
    pub pool: SqlitePool,
    pub api_key: String,
}

impl AppState {
    /// Open the pool, provision the schema, and assemble the state.
    pub async fn initialise(config: &ApiConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::ensure_schema(&pool).await?;
        Ok(Self::with_pool(pool, config.api_key.clone()))
    }

    /// Assemble the state on an already-provisioned pool.
    pub fn with_pool(pool: SqlitePool, api_key: String) -> Self {
        Self {
            patients: PatientRepository::new(pool.clone()),
            observations: ObservationRepository::new(pool.clone()),
            audit: AuditLog::new(pool.clone()),
            pool,
            api_key,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::root,
        routes::health,
        routes::create_patient,
        routes::list_patients,
        routes::search_patients,
        routes::read_patient,
        routes::replace_patient,
        routes::update_patient,
        routes::delete_patient,
        routes::create_observation,
        routes::list_observations,
        routes::list_logs,
    ),
    components(schemas(
        dto::RootRes,
        dto::HealthRes,
        dto::PatientMutationRes,
        dto::ObservationMutationRes,
        dto::DeleteRes,
        error::ErrorBody,
        fhirlite_core::Patient,
        fhirlite_core::PatientPage,
        fhirlite_core::PatientPayload,
        fhirlite_core::PatientUpdatePayload,
        fhirlite_core::Observation,
        fhirlite_core::ObservationPayload,
        fhirlite_core::LogEntry,
        fhirlite_core::Gender,
        fhirlite_core::AuditAction,
        fhirlite_core::ResourceKind,
    ))
)]
pub struct ApiDoc;

/// Build the full application router.
///
/// The root banner, the health probe and the OpenAPI document are open;
/// everything under `/fhir` and `/logs` requires the API key. The static
/// `search` segment is registered alongside `:id` and wins on exact match.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/fhir/Patient",
            get(routes::list_patients).post(routes::create_patient),
        )
        .route("/fhir/Patient/search", get(routes::search_patients))
        .route(
            "/fhir/Patient/:id",
            get(routes::read_patient)
                .put(routes::replace_patient)
                .patch(routes::update_patient)
                .delete(routes::delete_patient),
        )
        .route("/fhir/Observation", axum::routing::post(routes::create_observation))
        .route(
            "/fhir/Observation/:patient_id",
            get(routes::list_observations),
        )
        .route("/logs", get(routes::list_logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
