//! API integration tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use equipment_checks_server::{
    api,
    config::AppConfig,
    error::{AppError, AppResult},
    models::inspection::{InspectionRecord, RecentSubmission},
    repository::{memory::MemoryStore, InspectionStore, Repository},
    services::{identity::IdentityService, Services},
    AppState,
};

/// Store that behaves like an unreachable warehouse
struct UnreachableStore;

#[async_trait]
impl InspectionStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    async fn insert(&self, _record: &InspectionRecord) -> AppResult<()> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn fetch_recent(&self, _limit: u32) -> AppResult<Vec<RecentSubmission>> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn provision(&self) -> AppResult<()> {
        Err(AppError::Store("connection refused".to_string()))
    }
}

fn app_with(store: Arc<dyn InspectionStore>) -> Router {
    let config = AppConfig::default();
    let services = Services::new(
        Repository::new(store),
        config.inspections.clone(),
        IdentityService::new(None),
    );
    api::router(AppState::new(config, services))
}

fn checklist() -> Value {
    json!({
        "inspection_date": "2026-10-19",
        "facility_name": "Sydney Processing Centre",
        "nurse_name": "Alex Smith",
        "machine_type": "Centrifuge",
        "machine_id": "FX-2041",
        "room_location": "Donor Room 3",
        "power_status": "OK",
        "alarms_functional": true,
        "calibration_confirmed": true,
        "temperature_celsius": "4.5",
        "pressure_kpa": "",
        "cleaning_status": "Sanitized",
        "follow_up_required": false
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

fn post_inspection(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/inspections")
        .header("content-type", "application/json")
        .header("x-forwarded-email", "alex.smith@example.org")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_submission_appears_as_newest_row() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()));

    let (status, body) = send(&app, post_inspection(&checklist())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["temperature_celsius"], 4.5);
    assert!(body["pressure_kpa"].is_null());

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].temperature_celsius, Some(4.5));
    assert_eq!(records[0].pressure_kpa, None);
    assert_eq!(records[0].user_email.as_deref(), Some("alex.smith@example.org"));

    let (status, body) = send(&app, get("/api/v1/inspections/recent?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rows");
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0]["machine_id"], "FX-2041");
    assert_eq!(body["rows"][0]["facility_name"], "Sydney Processing Centre");
    assert_eq!(body["notice"], "Latest inspection saved to the warehouse.");

    // The confirmation is shown once
    let (_, body) = send(&app, get("/api/v1/inspections/recent")).await;
    assert!(body["notice"].is_null());
}

#[tokio::test]
async fn test_missing_follow_up_actions_rejected_without_write() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()));

    let mut form = checklist();
    form["follow_up_required"] = json!(true);
    form["follow_up_actions"] = json!("");

    let (status, body) = send(&app, post_inspection(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!(["Provide follow-up actions when follow-up is marked as required."])
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_all_validation_messages_returned() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()));

    let mut form = checklist();
    form["facility_name"] = json!("  ");
    form["room_location"] = json!("");
    form["temperature_celsius"] = json!("four");

    let (status, body) = send(&app, post_inspection(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!([
            "Facility name is required.",
            "Location is required.",
            "Temperature must be recorded as a number (e.g. 4.5)."
        ])
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_machine_type_returns_json_error() {
    let store = MemoryStore::new();
    let app = app_with(Arc::new(store.clone()));

    let mut form = checklist();
    form["machine_type"] = json!("Printer");

    let (status, body) = send(&app, post_inspection(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].as_str().unwrap().contains("machine_type"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_missing_inspection_date_returns_json_error() {
    let app = app_with(Arc::new(MemoryStore::new()));

    let mut form = checklist();
    form.as_object_mut().unwrap().remove("inspection_date");

    let (status, body) = send(&app, post_inspection(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_limit_returns_json_error() {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/inspections/recent?limit=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_recent_on_empty_store() {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/inspections/recent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["rows"], json!([]));
}

#[tokio::test]
async fn test_recent_on_unreachable_store() {
    let app = app_with(Arc::new(UnreachableStore));
    let (status, body) = send(&app, get("/api/v1/inspections/recent")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let app = app_with(Arc::new(UnreachableStore));
    let (status, body) = send(&app, post_inspection(&checklist())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Unable to save inspection: connection refused");

    let (_, body) = send(&app, get("/api/v1/inspections/recent")).await;
    assert!(body["notice"].is_null());
}

#[tokio::test]
async fn test_form_options() {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/inspections/options")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["machine_types"].as_array().unwrap().len(), 8);
    assert_eq!(body["power_statuses"], json!(["OK", "Needs Attention", "Out of Service"]));
    assert_eq!(body["defaults"]["alarms_functional"], true);
    assert!(body["user_email"].is_null());
    assert!(body["user_notice"].is_string());
}

#[tokio::test]
#[ignore] // Run with: DATABASE_URL=... cargo test -- --ignored
async fn test_postgres_round_trip() {
    use equipment_checks_server::repository::{postgres::PostgresStore, TableRef};
    use sqlx::postgres::PgPoolOptions;

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    let store = PostgresStore::new(pool, TableRef::new("", "checks_test", "equipment_checks"));
    store.provision().await.expect("Failed to provision table");

    let app = app_with(Arc::new(store));
    let (status, _) = send(&app, post_inspection(&checklist())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get("/api/v1/inspections/recent?limit=1")).await;
    assert_eq!(body["status"], "rows");
    assert_eq!(body["rows"][0]["machine_id"], "FX-2041");
}
