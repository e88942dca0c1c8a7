//! Outgoing ports: the traits persistence and payment adapters implement.
//!
//! The services in this crate only ever talk to these traits. Concrete
//! adapters are chosen when the application is wired together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ClientId, OrderId, ProductId};
use thiserror::Error;

use crate::client::{Client, Cpf, NewClient};
use crate::order::{Money, Order, OrderStatus};
use crate::product::{NewProduct, Product, ProductCategory};

/// Errors raised by persistence adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The order was modified since it was loaded.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A uniqueness constraint was violated.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by payment adapters.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The payment provider rejected the request.
    #[error("Payment provider rejected the request: {0}")]
    Rejected(String),

    /// The payment provider could not be reached.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Data returned by the payment provider for a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Payload encoded in the QR code the client scans to pay.
    pub qr_code_data: String,

    /// Reference of the payment on the provider side.
    pub external_id: String,
}

/// Persistence port for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order or updates an existing one.
    ///
    /// Updates succeed only when the stored version equals `order.version()`.
    /// Returns the order as persisted, with its version bumped.
    async fn save_order(&self, order: &Order) -> Result<Order, RepositoryError>;

    /// Loads an order by id.
    async fn find_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Loads every order whose status is one of `statuses`, in no particular order.
    async fn find_orders_by_status_in(
        &self,
        statuses: &[OrderStatus],
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Counts orders created within `[start, end]`.
    async fn count_orders_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, RepositoryError>;
}

/// Persistence port for clients.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Stores a new client and assigns its id. Fails with `Duplicate` on a known CPF.
    async fn save_client(&self, client: NewClient) -> Result<Client, RepositoryError>;

    async fn find_client_by_id(&self, id: ClientId) -> Result<Option<Client>, RepositoryError>;

    async fn find_client_by_cpf(&self, cpf: &Cpf) -> Result<Option<Client>, RepositoryError>;
}

/// Persistence port for catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Stores a new product and assigns its id.
    async fn save_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Lists products of a category ordered by id.
    async fn find_products_by_category(
        &self,
        category: ProductCategory,
    ) -> Result<Vec<Product>, RepositoryError>;
}

/// Port to the external payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a payment intent for an order and returns the QR payload.
    async fn create_payment_intent(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentIntent, PaymentError>;
}
