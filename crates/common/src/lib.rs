//! Shared identifier types for the fast-food order backend.

pub mod types;

pub use types::{ClientId, OrderId, ProductId};
