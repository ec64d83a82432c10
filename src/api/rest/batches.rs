use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::api::rest::form::FormFields;
use crate::api::rest::{listing, reference};
use crate::error::AppError;
use crate::models::batch::RecoveryRate;
use crate::state::AppState;
use crate::store::{procedures, Read, Row};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/batches", get(list_batches))
        .route("/create-batch", get(create_batch_form).post(create_batch))
        .route(
            "/batch/:batch_id/add-items",
            get(add_to_batch_form).post(add_to_batch),
        )
        .route("/batch/:batch_id/start", get(start_batch).post(start_batch))
        .route(
            "/batch/:batch_id/complete",
            get(complete_batch_form).post(complete_batch),
        )
}

async fn batch_summary(state: &AppState, batch_id: i32) -> Result<Row, AppError> {
    state
        .store
        .query_one(&Read::BatchSummary { batch_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {batch_id} not found")))
}

async fn list_batches(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(&state, &[("batches", Read::BatchSummaries)]).await
}

async fn create_batch_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    reference(&state, &[("facilities", Read::OperationalFacilities)]).await
}

async fn create_batch(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let facility_id = form.required_id("facility_id")?;
    let batch_name = form.required_text("batch_name")?;
    let notes = form.optional_text("notes").unwrap_or_default();

    state
        .store
        .call(&procedures::create_recycling_batch(
            facility_id,
            batch_name,
            notes,
        ))
        .await?;

    info!(facility_id, batch_name, "batch opened");
    Ok(Redirect::to("/batches"))
}

async fn add_to_batch_form(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let batch = batch_summary(&state, batch_id).await?;
    let items = state.store.query(&Read::UnbatchedItems).await?;

    Ok(Json(json!({
        "batch": batch,
        "items": items,
    })))
}

async fn add_to_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i32>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let item_id = form.required_id("item_id")?;

    state
        .store
        .call(&procedures::add_item_to_batch(batch_id, item_id))
        .await?;

    info!(batch_id, item_id, "item added to batch");
    Ok(Redirect::to(&format!("/batch/{batch_id}/add-items")))
}

async fn start_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i32>,
) -> Result<Redirect, AppError> {
    state
        .store
        .call(&procedures::start_batch_processing(batch_id))
        .await?;

    info!(batch_id, "batch processing started");
    Ok(Redirect::to("/batches"))
}

async fn complete_batch_form(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let batch = batch_summary(&state, batch_id).await?;
    Ok(Json(json!({ "batch": batch })))
}

async fn complete_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<i32>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let recovery_rate =
        RecoveryRate::new(form.required_float("recovery_rate")?).map_err(AppError::Validation)?;

    state
        .store
        .call(&procedures::complete_batch_processing(
            batch_id,
            recovery_rate,
        ))
        .await?;

    info!(batch_id, recovery_rate = recovery_rate.value(), "batch completed");
    Ok(Redirect::to("/batches"))
}
