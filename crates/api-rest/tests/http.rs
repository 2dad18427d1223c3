//! End-to-end tests over the in-memory router, no network involved.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_rest::{router, AppState};
use fhirlite_core::db;

const KEY: &str = "test-secret";

async fn app() -> Router {
    let pool = db::connect("sqlite::memory:").await.expect("open pool");
    db::ensure_schema(&pool).await.expect("provision schema");
    router(AppState::with_pool(pool, KEY.into()))
}

fn request(method: Method, uri: &str, key: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("infallible");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn anna() -> Value {
    json!({
        "id": "p1",
        "family_name": "Smith",
        "given_name": "Anna",
        "gender": "female",
        "birthDate": "1990-04-01",
        "medical_summary": "stable"
    })
}

#[tokio::test]
async fn root_and_health_are_open() {
    let app = app().await;

    let (status, body) = send(&app, request(Method::GET, "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "fhirlite");

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["patients"], 0);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_wrong_key() {
    let app = app().await;

    let (status, body) = send(&app, request(Method::GET, "/fhir/Patient", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].as_str().unwrap().contains("API key"));

    let (status, _) = send(
        &app,
        request(Method::GET, "/fhir/Patient", Some("wrong"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request(Method::GET, "/logs", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_patient_round_trip() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "p1");
    assert_eq!(body["birthDate"], "1990-04-01");
    assert_eq!(body["gender"], "female");
    assert!(body["message"].as_str().unwrap().contains("created"));

    let (status, body) = send(
        &app,
        request(Method::GET, "/fhir/Patient/p1", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["family_name"], "Smith");
}

#[tokio::test]
async fn invalid_gender_is_a_400_naming_the_field() {
    let app = app().await;

    let mut payload = anna();
    payload["gender"] = json!("Female");
    let (status, body) = send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("gender"));
}

#[tokio::test]
async fn duplicate_create_is_a_409() {
    let app = app().await;

    let (status, _) = send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("p1"));
}

#[tokio::test]
async fn search_segment_wins_over_the_id_route() {
    let app = app().await;

    send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/fhir/Patient/search?name=smi", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "p1");
}

#[tokio::test]
async fn patch_and_put_update_the_record() {
    let app = app().await;

    send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/fhir/Patient/p1",
            Some(KEY),
            Some(json!({ "gender": "other" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gender"], "other");
    assert_eq!(body["family_name"], "Smith");

    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/fhir/Patient/p1",
            Some(KEY),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("update"));

    let mut replacement = anna();
    replacement["family_name"] = json!("Jones");
    let (status, body) = send(
        &app,
        request(Method::PUT, "/fhir/Patient/p1", Some(KEY), Some(replacement)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["family_name"], "Jones");
    assert!(body["message"].as_str().unwrap().contains("replaced"));
}

#[tokio::test]
async fn observation_flow_and_cascade_delete() {
    let app = app().await;

    send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;

    let observation = json!({
        "patient_id": "p1",
        "category": "vital-signs",
        "code": "8310-5",
        "display": "Body temperature",
        "value": 37.2,
        "unit": "Cel",
        "date": "2024-06-01"
    });
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/fhir/Observation",
            Some(KEY),
            Some(observation.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["patient_id"], "p1");
    assert!(!body["id"].as_str().unwrap().is_empty());

    let mut orphan = observation.clone();
    orphan["patient_id"] = json!("ghost");
    let (status, _) = send(
        &app,
        request(Method::POST, "/fhir/Observation", Some(KEY), Some(orphan)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        request(Method::GET, "/fhir/Observation/p1", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request(Method::GET, "/fhir/Observation/ghost", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        request(Method::DELETE, "/fhir/Patient/p1", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], "p1");
    assert_eq!(body["observations_removed"], 1);
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    let (status, _) = send(
        &app,
        request(Method::GET, "/fhir/Patient/p1", Some(KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn audit_trail_records_successful_mutations_only() {
    let app = app().await;

    send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;
    // Duplicate create fails and must not leave a trail entry.
    send(
        &app,
        request(Method::POST, "/fhir/Patient", Some(KEY), Some(anna())),
    )
    .await;
    send(
        &app,
        request(
            Method::PATCH,
            "/fhir/Patient/p1",
            Some(KEY),
            Some(json!({ "medical_summary": "updated" })),
        ),
    )
    .await;
    send(
        &app,
        request(Method::PUT, "/fhir/Patient/p1", Some(KEY), Some(anna())),
    )
    .await;
    send(
        &app,
        request(
            Method::POST,
            "/fhir/Observation",
            Some(KEY),
            Some(json!({
                "patient_id": "p1",
                "category": "vital-signs",
                "code": "8310-5",
                "display": "Body temperature",
                "value": 36.6,
                "unit": "Cel",
                "date": "2024-06-01"
            })),
        ),
    )
    .await;
    send(
        &app,
        request(Method::DELETE, "/fhir/Patient/p1", Some(KEY), None),
    )
    .await;

    let (status, body) = send(&app, request(Method::GET, "/logs", Some(KEY), None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    let trail: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| {
            (
                e["action"].as_str().unwrap(),
                e["resource"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        trail,
        vec![
            ("DELETE", "Patient"),
            ("CREATE", "Observation"),
            ("PUT", "Patient"),
            ("PATCH", "Patient"),
            ("CREATE", "Patient"),
        ]
    );

    let (status, body) = send(&app, request(Method::GET, "/logs?limit=1", Some(KEY), None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "DELETE");
}

#[tokio::test]
async fn degraded_storage_is_reported_in_the_health_body() {
    let pool = db::connect("sqlite::memory:").await.expect("open pool");
    db::ensure_schema(&pool).await.expect("provision schema");
    let app = router(AppState::with_pool(pool.clone(), KEY.into()));

    sqlx::query("DROP TABLE patients")
        .execute(&pool)
        .await
        .expect("drop table");

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert!(!body["error"].as_str().unwrap().is_empty());
}
