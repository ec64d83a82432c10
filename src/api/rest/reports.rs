use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::rest::listing;
use crate::state::AppState;
use crate::store::Read;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/reports", get(reports))
}

async fn reports(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(
        &state,
        &[
            ("user_activity", Read::UserActivity),
            ("category_stats", Read::CategoryStatistics),
            ("facility_capacity", Read::FacilityCapacity),
            ("pickup_status", Read::PickupStatusTotals),
        ],
    )
    .await
}
