//! Order and payment state machines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► PaymentPending ──► PaymentConfirmed ──► Preparing ──► Ready ──► Received ──► Finished
///    │              │                   │                 │
///    └──────────────┴───────────────────┴─────────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order was assembled but no payment intent exists yet.
    #[default]
    Created,

    /// A payment QR code was issued, waiting for the client to pay.
    PaymentPending,

    /// Payment approved, order sits in the kitchen queue.
    PaymentConfirmed,

    /// Kitchen is preparing the order.
    Preparing,

    /// Order is ready for pickup.
    Ready,

    /// Client picked up the order.
    Received,

    /// Order is closed (terminal state).
    Finished,

    /// Order was cancelled (terminal state).
    Cancelled,
}

const IN_PREPARATION: [OrderStatus; 3] = [
    OrderStatus::PaymentConfirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Created,
        OrderStatus::PaymentPending,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Received,
        OrderStatus::Finished,
        OrderStatus::Cancelled,
    ];

    /// Statuses that make an order show up in the kitchen queue.
    pub fn in_preparation() -> &'static [OrderStatus] {
        &IN_PREPARATION
    }

    /// Rank used to order the kitchen queue display. Lower ranks come first.
    pub fn presentation_order(&self) -> u8 {
        match self {
            OrderStatus::Ready => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::PaymentConfirmed => 3,
            OrderStatus::Received => 4,
            OrderStatus::PaymentPending => 5,
            OrderStatus::Created => 6,
            OrderStatus::Finished => 7,
            OrderStatus::Cancelled => 8,
        }
    }

    /// Returns true if a payment intent can be attached in this status.
    pub fn can_await_payment(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the payment can be confirmed in this status.
    pub fn can_confirm_payment(&self) -> bool {
        matches!(self, OrderStatus::PaymentPending)
    }

    /// Returns true if preparation can start in this status.
    pub fn can_start_preparation(&self) -> bool {
        matches!(self, OrderStatus::PaymentConfirmed)
    }

    /// Returns true if preparation can be finished in this status.
    pub fn can_finish_preparation(&self) -> bool {
        matches!(self, OrderStatus::Preparing)
    }

    /// Returns true if the order can be handed to the client in this status.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Ready)
    }

    /// Returns true if the order can be closed in this status.
    pub fn can_finish(&self) -> bool {
        matches!(self, OrderStatus::Received)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Created
                | OrderStatus::PaymentPending
                | OrderStatus::PaymentConfirmed
                | OrderStatus::Preparing
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finished | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored and exchanged over the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::PaymentPending => "PAYMENT_PENDING",
            OrderStatus::PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Finished => "FINISHED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// The status of the payment attached to an order.
///
/// `Pending` moves to either `Approved` or `Refused`; both are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Refused,
}

impl PaymentStatus {
    pub fn is_payment_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Refused => "REFUSED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "APPROVED" => Ok(PaymentStatus::Approved),
            "REFUSED" => Ok(PaymentStatus::Refused),
            other => Err(OrderError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_only_payment_confirmed_can_start_preparation() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_start_preparation(),
                status == OrderStatus::PaymentConfirmed,
                "{status}"
            );
        }
    }

    #[test]
    fn test_kitchen_edges_are_sequential() {
        assert!(OrderStatus::Preparing.can_finish_preparation());
        assert!(!OrderStatus::PaymentConfirmed.can_finish_preparation());
        assert!(OrderStatus::Ready.can_deliver());
        assert!(!OrderStatus::Preparing.can_deliver());
        assert!(OrderStatus::Received.can_finish());
        assert!(!OrderStatus::Ready.can_finish());
    }

    #[test]
    fn test_can_cancel_until_order_is_ready() {
        assert!(OrderStatus::Created.can_cancel());
        assert!(OrderStatus::PaymentPending.can_cancel());
        assert!(OrderStatus::PaymentConfirmed.can_cancel());
        assert!(OrderStatus::Preparing.can_cancel());
        assert!(!OrderStatus::Ready.can_cancel());
        assert!(!OrderStatus::Received.can_cancel());
        assert!(!OrderStatus::Finished.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_terminal)
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Finished, OrderStatus::Cancelled]);
    }

    #[test]
    fn test_in_preparation_ranks_ready_first() {
        let mut queued = OrderStatus::in_preparation().to_vec();
        queued.sort_by_key(OrderStatus::presentation_order);
        assert_eq!(
            queued,
            vec![
                OrderStatus::Ready,
                OrderStatus::Preparing,
                OrderStatus::PaymentConfirmed
            ]
        );
    }

    #[test]
    fn test_presentation_order_is_unique() {
        let mut ranks: Vec<_> = OrderStatus::ALL
            .iter()
            .map(OrderStatus::presentation_order)
            .collect();
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), OrderStatus::ALL.len());
    }

    #[test]
    fn test_parse_matches_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!(matches!(
            "BOGUS".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus(name)) if name == "BOGUS"
        ));
        assert!("preparing".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization_uses_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentConfirmed).unwrap();
        assert_eq!(json, "\"PAYMENT_CONFIRMED\"");

        let status: PaymentStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert!(status.is_payment_approved());
    }
}
