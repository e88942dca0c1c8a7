//! Client registration and identification endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ClientId;
use domain::{ClientView, DomainError, NewClient, PaymentGateway};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::{json_body, query_params};
use crate::{AppState, Store};

#[derive(Deserialize)]
pub struct RegisterClientRequest {
    pub name: String,
    pub email: String,
    pub cpf: String,
}

#[derive(Deserialize)]
pub struct IdentifyQuery {
    pub cpf: String,
}

/// POST /client
#[tracing::instrument(skip(state, payload))]
pub async fn register<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    payload: Result<Json<RegisterClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientView>), ApiError> {
    let req = json_body(payload)?;
    let client = NewClient::new(&req.name, &req.email, &req.cpf).map_err(DomainError::from)?;

    let client = state.clients().register_client(client).await?;

    Ok((StatusCode::CREATED, Json(ClientView::from(&client))))
}

/// GET /client/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<ClientView>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid client id: {e}")))?;

    let client = state.clients().find_client_by_id(ClientId::new(id)).await?;

    Ok(Json(ClientView::from(&client)))
}

/// GET /client?cpf=: identify a client by CPF.
#[tracing::instrument(skip(state, query))]
pub async fn identify<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    query: Result<Query<IdentifyQuery>, QueryRejection>,
) -> Result<Json<ClientView>, ApiError> {
    let query = query_params(query)?;
    let client = state.clients().identify_client(&query.cpf).await?;
    Ok(Json(ClientView::from(&client)))
}
