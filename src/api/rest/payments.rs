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
        .route("/payments", get(list_payments))
        .route("/make-payment", get(make_payment_form).post(make_payment))
}

async fn list_payments(State(state): State<Arc<AppState>>) -> Json<Value> {
    listing(&state, &[("payments", Read::PaymentSummaries)]).await
}

async fn make_payment_form(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    reference(&state, &[("pickups", Read::CollectedPickups)]).await
}

async fn make_payment(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let pickup_id = form.required_id("pickup_id")?;
    let method = form.required_text("payment_method")?;
    let transaction_ref = form.optional_text("transaction_ref").map(str::to_string);

    state
        .store
        .call(&procedures::process_payment(pickup_id, method, transaction_ref))
        .await?;

    info!(pickup_id, method, "payment processed");
    Ok(Redirect::to("/payments"))
}
