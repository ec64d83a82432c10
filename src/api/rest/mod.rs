pub mod assignments;
pub mod batches;
pub mod form;
pub mod items;
pub mod lookup;
pub mod payments;
pub mod pickups;
pub mod reports;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde_json::{json, Map, Value};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Read, Row};

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.static_dir);

    Router::new()
        .merge(pickups::router())
        .merge(items::router())
        .merge(assignments::router())
        .merge(payments::router())
        .merge(batches::router())
        .merge(reports::router())
        .merge(lookup::router())
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .fallback_service(static_dir)
        .layer(TraceLayer::new_for_http())
}

fn rows_value(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// Listing page: each section's rows, or every section empty plus an
/// `error` notice when any read fails.
pub(crate) async fn listing(state: &AppState, sections: &[(&str, Read)]) -> Json<Value> {
    let mut body = Map::new();

    for (key, read) in sections {
        match state.store.query(read).await {
            Ok(rows) => {
                body.insert(key.to_string(), rows_value(rows));
            }
            Err(err) => {
                warn!(read = read.name(), error = %err, "listing degraded to empty result");

                let mut empty = Map::new();
                for (section, _) in sections {
                    empty.insert(section.to_string(), Value::Array(Vec::new()));
                }
                empty.insert(
                    "error".to_string(),
                    Value::String(format!("could not load {key}, try again later")),
                );
                return Json(Value::Object(empty));
            }
        }
    }

    Json(Value::Object(body))
}

/// Reference data backing a form; unlike listings, failures propagate.
pub(crate) async fn reference(state: &AppState, sections: &[(&str, Read)]) -> Result<Json<Value>, AppError> {
    let mut body = Map::new();
    for (key, read) in sections {
        let rows = state.store.query(read).await?;
        body.insert(key.to_string(), rows_value(rows));
    }
    Ok(Json(Value::Object(body)))
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.store.query_one(&Read::DashboardStats).await {
        Ok(Some(stats)) => Json(json!({ "stats": stats })),
        outcome => {
            if let Err(err) = outcome {
                warn!(error = %err, "dashboard degraded to zero counts");
            }
            Json(json!({
                "stats": {
                    "active_users": 0,
                    "pending_pickups": 0,
                    "completed_pickups": 0,
                    "total_weight": 0,
                    "open_batches": 0,
                },
                "error": "could not load dashboard statistics, try again later",
            }))
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.call_function("version", &[]).await {
        Ok(version) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": version })),
        ),
        Err(err) => {
            warn!(error = %err, "health check could not reach store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": Value::Null })),
            )
        }
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
