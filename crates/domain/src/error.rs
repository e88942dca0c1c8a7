//! Domain error types.

use common::{ClientId, OrderId, ProductId};
use thiserror::Error;

use crate::client::ClientError;
use crate::order::OrderError;
use crate::ports::{PaymentError, RepositoryError};
use crate::product::ProductError;

/// What an `OrderNotFound` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    /// A specific order id had no record.
    Id(OrderId),
    /// A query returned no orders.
    Message(String),
}

impl std::fmt::Display for OrderLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderLookup::Id(id) => write!(f, "no order with id {id}"),
            OrderLookup::Message(msg) => write!(f, "{msg}"),
        }
    }
}

/// Errors surfaced by the use cases.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced client id has no record.
    #[error("Client not found with id {0}")]
    ClientNotFound(ClientId),

    /// No client registered with the given CPF.
    #[error("Client not found with CPF {0}")]
    ClientNotFoundByCpf(String),

    /// Referenced product id has no record.
    #[error("Product not found with id {0}")]
    ProductNotFound(ProductId),

    /// Order id absent, or an order query came back empty.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderLookup),

    /// The requested operation is not valid for the order.
    #[error("Invalid order operation: {0}")]
    InvalidOrderOperation(String),

    /// Client registration data is invalid.
    #[error("Invalid client: {0}")]
    InvalidClient(#[from] ClientError),

    /// Product data is invalid.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// A client with the same CPF already exists.
    #[error("Client already exists: {0}")]
    ClientAlreadyExists(String),

    /// A persistence adapter failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The payment provider failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),
}

impl From<OrderError> for DomainError {
    fn from(err: OrderError) -> Self {
        DomainError::InvalidOrderOperation(err.to_string())
    }
}
