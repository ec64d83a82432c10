//! JSON lookups by id. A missing record yields `{}` rather than a 404.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Read, Row};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pickup/:pickup_id", get(pickup))
        .route("/api/user-stats/:user_id", get(user_stats))
}

async fn pickup(
    State(state): State<Arc<AppState>>,
    Path(pickup_id): Path<i32>,
) -> Result<Json<Row>, AppError> {
    let row = state
        .store
        .query_one(&Read::PickupSummary { pickup_id })
        .await?;
    Ok(Json(row.unwrap_or_default()))
}

async fn user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Row>, AppError> {
    let row = state.store.query_one(&Read::UserStats { user_id }).await?;
    Ok(Json(row.unwrap_or_default()))
}
