//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{
    DomainError, Money, NewProduct, PaymentGateway, ProductCategory, ProductError, ProductView,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::{json_body, query_params};
use crate::{AppState, Store};

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

/// POST /product
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    let req = json_body(payload)?;

    let category = parse_category(&req.category)?;
    let price = Money::from_decimal(req.price)
        .ok_or_else(|| DomainError::from(ProductError::InvalidPrice(req.price.to_string())))?;
    let product =
        NewProduct::new(&req.name, &req.description, category, price).map_err(DomainError::from)?;

    let product = state.products().create_product(product).await?;

    Ok((StatusCode::CREATED, Json(ProductView::from(&product))))
}

/// GET /product/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id: {e}")))?;

    let product = state
        .products()
        .find_product_by_id(ProductId::new(id))
        .await?;

    Ok(Json(ProductView::from(&product)))
}

/// GET /products?category=
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let query = query_params(query)?;
    let category = parse_category(&query.category)?;

    let products = state.products().list_products_by_category(category).await?;

    Ok(Json(products.iter().map(ProductView::from).collect()))
}

fn parse_category(raw: &str) -> Result<ProductCategory, ApiError> {
    raw.to_ascii_uppercase()
        .parse::<ProductCategory>()
        .map_err(|e| ApiError::Domain(DomainError::from(e)))
}
