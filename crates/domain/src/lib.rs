//! Domain layer for the fast-food order backend.
//!
//! This crate provides:
//! - the Order aggregate with its status and payment state machines
//! - Client and Product entities
//! - ports (traits) for persistence and payment adapters
//! - the services implementing the use cases
//! - in-memory adapters for tests and local runs

pub mod client;
pub mod error;
pub mod memory;
pub mod order;
pub mod ports;
pub mod product;

pub use client::{Client, ClientError, ClientService, ClientView, Cpf, NewClient};
pub use error::{DomainError, OrderLookup};
pub use memory::{InMemoryPaymentGateway, InMemoryStore};
pub use order::{
    Money, Order, OrderError, OrderRecord, OrderService, OrderStatus, OrderView, PaymentStatus,
    PaymentStatusView,
};
pub use ports::{
    ClientRepository, OrderRepository, PaymentError, PaymentGateway, PaymentIntent,
    ProductRepository, RepositoryError,
};
pub use product::{NewProduct, Product, ProductCategory, ProductError, ProductService, ProductView};
