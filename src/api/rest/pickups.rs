use std::sync::Arc;

use axum::extract::{Path, State};
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
        .route("/pickups", get(list_pickups))
        .route("/create-pickup", get(create_pickup_form).post(create_pickup))
        .route(
            "/complete-collection/:pickup_id",
            get(complete_collection).post(complete_collection),
        )
}

async fn list_pickups(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(&state, &[("pickups", Read::PickupSummaries)]).await
}

async fn create_pickup_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    reference(&state, &[("users", Read::ActiveUsers)]).await
}

async fn create_pickup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let user_id = form.required_id("user_id")?;
    let preferred_date = form.required_date("preferred_date")?;
    let address = form.required_text("address")?;
    let notes = form.optional_text("notes").unwrap_or_default();

    state
        .store
        .call(&procedures::create_pickup_request(
            user_id,
            preferred_date,
            address,
            notes,
        ))
        .await?;

    info!(user_id, %preferred_date, "pickup requested");
    Ok(Redirect::to("/pickups"))
}

async fn complete_collection(
    State(state): State<Arc<AppState>>,
    Path(pickup_id): Path<i32>,
) -> Result<Redirect, AppError> {
    state
        .store
        .call(&procedures::complete_pickup_collection(pickup_id))
        .await?;

    info!(pickup_id, "pickup collected");
    Ok(Redirect::to("/pickups"))
}
