//! Order aggregate and related types.

mod aggregate;
mod service;
mod state;
mod value_objects;
mod view;

pub use aggregate::{Order, OrderRecord};
pub use service::{OrderService, local_day_bounds, sort_by_queue_position};
pub use state::{OrderStatus, PaymentStatus};
pub use value_objects::Money;
pub use view::{OrderView, PaymentStatusView};

use thiserror::Error;

/// Errors raised by the order aggregate and its state machines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Order is not in the expected status.
    #[error("cannot {action} an order in {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Payment is not in the expected status.
    #[error("cannot {action} an order whose payment is {payment_status}")]
    InvalidPaymentState {
        payment_status: PaymentStatus,
        action: &'static str,
    },

    /// Sum of the product prices does not fit in an amount.
    #[error("order total exceeds the largest supported amount")]
    TotalOverflow,

    /// Status name does not match any order status.
    #[error("no order status named {0}")]
    UnknownStatus(String),

    /// Status name does not match any payment status.
    #[error("no payment status named {0}")]
    UnknownPaymentStatus(String),
}
