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
        .route("/items", get(list_items))
        .route("/add-items", get(add_items_form).post(add_item))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(&state, &[("items", Read::ItemDetails)]).await
}

async fn add_items_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    reference(
        &state,
        &[
            ("pickups", Read::IntakePickups),
            ("categories", Read::Categories),
        ],
    )
    .await
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let pickup_id = form.required_id("pickup_id")?;
    let category_id = form.required_id("category_id")?;
    let description = form.required_text("description")?;
    let condition = form.required_text("condition")?;
    let estimated_weight = form.optional_float("estimated_weight")?;
    if estimated_weight.is_some_and(|weight| weight < 0.0) {
        return Err(AppError::Validation(
            "estimated_weight cannot be negative".to_string(),
        ));
    }
    let is_hazardous = form.optional_flag("is_hazardous");

    state
        .store
        .call(&procedures::add_item_to_pickup(
            pickup_id,
            category_id,
            description,
            condition,
            estimated_weight,
            is_hazardous,
        ))
        .await?;

    info!(pickup_id, category_id, "item registered");
    Ok(Redirect::to("/items"))
}
