use common::OrderId;
use domain::RepositoryError;
use thiserror::Error;

/// Errors that can occur when talking to PostgreSQL.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored order version did not match the version being saved.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A client with the same CPF is already registered.
    #[error("Duplicate CPF: {0}")]
    DuplicateCpf(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back to the domain.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual,
            } => RepositoryError::ConcurrencyConflict {
                order_id,
                expected,
                actual,
            },
            StoreError::DuplicateCpf(cpf) => RepositoryError::Duplicate(format!("cpf {cpf}")),
            other => RepositoryError::Backend(Box::new(other)),
        }
    }
}
