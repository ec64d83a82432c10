use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use recycle_dispatch::api::rest::router;
use recycle_dispatch::state::AppState;
use recycle_dispatch::store::{MemoryStore, Read, Row, SqlArg, Store, StoreError};
use serde_json::Value;
use tower::ServiceExt;

fn setup() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::demo());
    let state = AppState::new(store.clone());
    (router(Arc::new(state)), store)
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap()
}

async fn post(app: &Router, uri: &str, body: &str) -> axum::response::Response {
    app.clone().oneshot(form_request(uri, body)).await.unwrap()
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let response = app.clone().oneshot(get_request(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    body_json(response).await
}

/// Drives a pickup with one 3 kg computer through to payment.
async fn completed_pickup(app: &Router) {
    let steps = [
        ("/create-pickup", "user_id=1&preferred_date=2025-01-10&address=12+Elm+St"),
        (
            "/add-items",
            "pickup_id=1&category_id=2&description=Old+laptop&condition=broken&estimated_weight=3",
        ),
        ("/assign-pickup", "pickup_id=1&staff_id=2&vehicle_id=3&facility_id=1"),
        ("/complete-collection/1", ""),
        ("/make-payment", "pickup_id=1&payment_method=cash"),
    ];
    for (uri, body) in steps {
        let response = post(app, uri, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {uri}");
    }
}

#[tokio::test]
async fn health_reports_store_version() {
    let (app, _store) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["store"].as_str().unwrap().starts_with("memory store"));
}

#[tokio::test]
async fn metrics_count_store_calls() {
    let (app, _store) = setup();
    get_json(&app, "/pickups").await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("store_calls_total"));
    assert!(body.contains("store_call_latency_seconds"));
}

#[tokio::test]
async fn dashboard_counts_active_users() {
    let (app, _store) = setup();
    let body = get_json(&app, "/").await;

    assert_eq!(body["stats"]["active_users"], 3);
    assert_eq!(body["stats"]["pending_pickups"], 0);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn create_pickup_redirects_and_lists_pending() {
    let (app, store) = setup();
    let response = post(
        &app,
        "/create-pickup",
        "user_id=1&preferred_date=2025-01-10&address=12+Elm+St",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/pickups");
    assert_eq!(store.last_pickup_id(), Some(1));

    let body = get_json(&app, "/pickups").await;
    let pickups = body["pickups"].as_array().unwrap();
    assert_eq!(pickups.len(), 1);
    assert_eq!(pickups[0]["status"], "pending");
    assert_eq!(pickups[0]["pickup_address"], "12 Elm St");
    assert_eq!(pickups[0]["preferred_date"], "2025-01-10");
}

#[tokio::test]
async fn create_pickup_form_lists_active_users() {
    let (app, store) = setup();
    store.set_user_active(3, false);

    let body = get_json(&app, "/create-pickup").await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_form_fields_are_rejected() {
    let (app, store) = setup();

    let cases = [
        ("/create-pickup", "user_id=1&preferred_date=10/01/2025&address=12+Elm+St"),
        ("/create-pickup", "user_id=abc&preferred_date=2025-01-10&address=12+Elm+St"),
        ("/create-pickup", "user_id=1&preferred_date=2025-01-10&address=+"),
        ("/assign-pickup", "pickup_id=1&staff_id=2&vehicle_id=3"),
    ];
    for (uri, body) in cases {
        let response = post(&app, uri, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "POST {uri} {body}");

        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }
    assert_eq!(store.last_pickup_id(), None);
}

#[tokio::test]
async fn negative_estimated_weight_is_rejected() {
    let (app, store) = setup();
    post(
        &app,
        "/create-pickup",
        "user_id=1&preferred_date=2025-01-10&address=12+Elm+St",
    )
    .await;

    let response = post(
        &app,
        "/add-items",
        "pickup_id=1&category_id=2&description=Old+laptop&condition=broken&estimated_weight=-2",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.last_item_id(), None);
}

#[tokio::test]
async fn assigning_takes_crew_out_of_rotation() {
    let (app, store) = setup();
    store.add_facility("West Depot", "Quay St 2", 5_000.0);
    let facility_id = store.add_facility("South Yard", "Rail Rd 9", 5_000.0);
    assert_eq!(facility_id, 4);

    post(
        &app,
        "/create-pickup",
        "user_id=1&preferred_date=2025-01-10&address=12+Elm+St",
    )
    .await;

    let response = post(
        &app,
        "/assign-pickup",
        "pickup_id=1&staff_id=2&vehicle_id=3&facility_id=4",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/staff-dashboard");

    let pickup = get_json(&app, "/api/pickup/1").await;
    assert_eq!(pickup["status"], "assigned");

    let form = get_json(&app, "/assign-pickup").await;
    assert!(form["pickups"].as_array().unwrap().is_empty());
    assert!(form["staff"]
        .as_array()
        .unwrap()
        .iter()
        .all(|staff| staff["staff_id"] != 2));
    assert!(form["vehicles"]
        .as_array()
        .unwrap()
        .iter()
        .all(|vehicle| vehicle["vehicle_id"] != 3));

    let again = post(
        &app,
        "/assign-pickup",
        "pickup_id=1&staff_id=1&vehicle_id=1&facility_id=1",
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn payment_requires_collected_pickup() {
    let (app, _store) = setup();
    post(
        &app,
        "/create-pickup",
        "user_id=1&preferred_date=2025-01-10&address=12+Elm+St",
    )
    .await;

    let response = post(&app, "/make-payment", "pickup_id=1&payment_method=cash").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let payments = get_json(&app, "/payments").await;
    assert!(payments["payments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn full_pickup_lifecycle_prices_and_pays() {
    let (app, _store) = setup();
    completed_pickup(&app).await;

    let pickup = get_json(&app, "/api/pickup/1").await;
    assert_eq!(pickup["status"], "completed");
    assert_eq!(pickup["total_weight_kg"], 3.0);
    assert_eq!(pickup["total_amount"], 7.5);

    let payments = get_json(&app, "/payments").await;
    let payments = payments["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["amount"], 7.5);
    assert_eq!(payments[0]["payment_method"], "cash");

    let form = get_json(&app, "/assign-pickup").await;
    assert!(form["staff"]
        .as_array()
        .unwrap()
        .iter()
        .any(|staff| staff["staff_id"] == 2));

    let stats = get_json(&app, "/api/user-stats/1").await;
    assert!(stats.as_object().is_some_and(|stats| !stats.is_empty()));
}

#[tokio::test]
async fn collected_pickup_rejects_more_items() {
    let (app, _store) = setup();
    completed_pickup(&app).await;

    let response = post(
        &app,
        "/add-items",
        "pickup_id=1&category_id=1&description=Battery&condition=used",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn batch_lifecycle_records_recovery_rate() {
    let (app, store) = setup();
    completed_pickup(&app).await;

    let response = post(&app, "/create-batch", "facility_id=1&batch_name=January+run").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/batches");
    let batch_id = store.last_batch_id().unwrap();

    let add_uri = format!("/batch/{batch_id}/add-items");
    let form = get_json(&app, &add_uri).await;
    assert_eq!(form["batch"]["status"], "open");
    assert_eq!(form["items"].as_array().unwrap().len(), 1);

    let response = post(&app, &add_uri, "item_id=1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), add_uri);

    let early = post(
        &app,
        &format!("/batch/{batch_id}/complete"),
        "recovery_rate=87.5",
    )
    .await;
    assert_eq!(early.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/batch/{batch_id}/start")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post(
        &app,
        &format!("/batch/{batch_id}/complete"),
        "recovery_rate=87.5",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/batches");

    let batches = get_json(&app, "/batches").await;
    let batch = &batches["batches"][0];
    assert_eq!(batch["status"], "completed");
    assert_eq!(batch["recovery_rate"], 87.5);
    assert_eq!(batch["item_count"], 1);
}

#[tokio::test]
async fn item_cannot_join_two_batches() {
    let (app, store) = setup();
    completed_pickup(&app).await;

    post(&app, "/create-batch", "facility_id=1&batch_name=First").await;
    post(&app, "/create-batch", "facility_id=2&batch_name=Second").await;
    post(&app, "/batch/1/add-items", "item_id=1").await;
    assert_eq!(store.batch_item_count(), 1);

    let response = post(&app, "/batch/2/add-items", "item_id=1").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"], "item 1 already belongs to batch 1");
    assert_eq!(store.batch_item_count(), 1);
}

#[tokio::test]
async fn recovery_rate_out_of_range_is_rejected() {
    let (app, _store) = setup();
    post(&app, "/create-batch", "facility_id=1&batch_name=January+run").await;
    post(&app, "/batch/1/start", "").await;

    for rate in ["101", "-1", "lots"] {
        let response = post(&app, "/batch/1/complete", &format!("recovery_rate={rate}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "rate {rate}");
    }

    let batch = get_json(&app, "/batch/1/complete").await;
    assert_eq!(batch["batch"]["status"], "processing");
}

#[tokio::test]
async fn missing_batch_page_is_not_found() {
    let (app, _store) = setup();
    let response = app
        .oneshot(get_request("/batch/99/add-items"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookups_return_empty_object_for_unknown_ids() {
    let (app, _store) = setup();

    let pickup = get_json(&app, "/api/pickup/999").await;
    assert_eq!(pickup, serde_json::json!({}));

    let stats = get_json(&app, "/api/user-stats/999").await;
    assert_eq!(stats, serde_json::json!({}));
}

#[tokio::test]
async fn reports_cover_every_section() {
    let (app, _store) = setup();
    completed_pickup(&app).await;

    let body = get_json(&app, "/reports").await;
    for section in ["user_activity", "category_stats", "facility_capacity", "pickup_status"] {
        assert!(body[section].is_array(), "section {section}");
    }
    assert!(body.get("error").is_none());
}

struct UnreachableStore;

#[async_trait]
impl Store for UnreachableStore {
    async fn query(&self, _read: &Read) -> Result<Vec<Row>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn call_procedure(&self, _name: &str, _args: &[SqlArg]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn call_function(&self, _name: &str, _args: &[SqlArg]) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn listings_degrade_when_store_is_unreachable() {
    let app = router(Arc::new(AppState::new(Arc::new(UnreachableStore))));

    let body = get_json(&app, "/reports").await;
    assert!(body["user_activity"].as_array().unwrap().is_empty());
    assert!(body["pickup_status"].as_array().unwrap().is_empty());
    assert!(body["error"].is_string());

    let dashboard = get_json(&app, "/").await;
    assert_eq!(dashboard["stats"]["active_users"], 0);
    assert!(dashboard["error"].is_string());

    let response = post(
        &app,
        "/create-pickup",
        "user_id=1&preferred_date=2025-01-10&address=12+Elm+St",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_string(response).await;
    assert!(!body.contains("connection refused"));

    let health = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
}
