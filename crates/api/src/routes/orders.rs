//! Order endpoints: creation, kitchen queue, payment and status updates.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{ClientId, OrderId, ProductId};
use domain::{OrderView, PaymentGateway, PaymentStatusView};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::json_body;
use crate::{AppState, Store};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: Option<i64>,
    pub product_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Handlers --

/// POST /order: create an order and register its payment intent.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let req = json_body(payload)?;

    let view = state
        .order_service
        .create_order(
            req.client_id.map(ClientId::new),
            req.product_ids.into_iter().map(ProductId::new).collect(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /orders/queued: orders the kitchen still has to hand out.
#[tracing::instrument(skip(state))]
pub async fn queued<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.order_service.list_queued_orders().await?))
}

/// POST /order/{id}/confirm-payment: approve the payment and start the order.
#[tracing::instrument(skip(state))]
pub async fn confirm_payment<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.order_service.confirm_payment(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /order/{id}/payment-status
#[tracing::instrument(skip(state))]
pub async fn payment_status<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentStatusView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(
        state.order_service.get_order_payment_status(order_id).await?,
    ))
}

/// PATCH /order/{id}/status: move an order along the kitchen workflow.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let req = json_body(payload)?;

    let view = state
        .order_service
        .update_order_status(order_id, &req.status)
        .await?;

    Ok(Json(view))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
