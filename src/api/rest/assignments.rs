use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::Value;
use tracing::info;

use crate::api::rest::form::FormFields;
use crate::api::rest::{listing, reference};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{procedures, Read};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assign-pickup", get(assign_pickup_form).post(assign_pickup))
        .route("/staff-dashboard", get(staff_dashboard))
}

async fn assign_pickup_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    reference(
        &state,
        &[
            ("pickups", Read::PendingPickups),
            ("staff", Read::AvailableStaff),
            ("vehicles", Read::AvailableVehicles),
            ("facilities", Read::OperationalFacilities),
        ],
    )
    .await
}

async fn assign_pickup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let pickup_id = form.required_id("pickup_id")?;
    let staff_id = form.required_id("staff_id")?;
    let vehicle_id = form.required_id("vehicle_id")?;
    let facility_id = form.required_id("facility_id")?;

    state
        .store
        .call(&procedures::assign_pickup_to_staff(
            pickup_id,
            staff_id,
            vehicle_id,
            facility_id,
        ))
        .await?;

    info!(pickup_id, staff_id, vehicle_id, facility_id, "pickup assigned");
    Ok(Redirect::to("/staff-dashboard"))
}

async fn staff_dashboard(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(
        &state,
        &[
            ("staff", Read::StaffWorkload),
            ("pickups", Read::ActivePickups),
        ],
    )
    .await
}
