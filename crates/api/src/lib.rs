//! HTTP API server with observability for the fast-food order backend.
//!
//! Provides REST endpoints for orders, clients and products, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::{
    ClientRepository, ClientService, OrderRepository, OrderService, PaymentGateway,
    ProductRepository, ProductService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Storage backend serving every repository port.
pub trait Store: OrderRepository + ClientRepository + ProductRepository + Clone + 'static {}

impl<T> Store for T where T: OrderRepository + ClientRepository + ProductRepository + Clone + 'static
{}

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, G: PaymentGateway> {
    pub order_service: OrderService<S, S, S, G>,
}

impl<S: Store, G: PaymentGateway> AppState<S, G> {
    /// Wires the services over a single store and a payment gateway.
    pub fn new(store: S, payments: G) -> Self {
        let order_service = OrderService::new(
            store.clone(),
            ClientService::new(store.clone()),
            ProductService::new(store),
            payments,
        );
        Self { order_service }
    }

    pub fn clients(&self) -> &ClientService<S> {
        self.order_service.clients()
    }

    pub fn products(&self) -> &ProductService<S> {
        self.order_service.products()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Store,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/order", post(routes::orders::create::<S, G>))
        .route("/orders/queued", get(routes::orders::queued::<S, G>))
        .route(
            "/order/{id}/confirm-payment",
            post(routes::orders::confirm_payment::<S, G>),
        )
        .route(
            "/order/{id}/payment-status",
            get(routes::orders::payment_status::<S, G>),
        )
        .route("/order/{id}/status", patch(routes::orders::update_status::<S, G>))
        .route(
            "/client",
            post(routes::clients::register::<S, G>).get(routes::clients::identify::<S, G>),
        )
        .route("/client/{id}", get(routes::clients::get::<S, G>))
        .route("/product", post(routes::products::create::<S, G>))
        .route("/product/{id}", get(routes::products::get::<S, G>))
        .route("/products", get(routes::products::list::<S, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
