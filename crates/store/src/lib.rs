//! PostgreSQL adapters for the domain's persistence ports.

pub mod error;
pub mod postgres;

pub use error::{Result, StoreError};
pub use postgres::PostgresStore;
