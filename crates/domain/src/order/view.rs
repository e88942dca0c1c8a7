//! Response views of orders.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::Serialize;

use crate::client::ClientView;
use crate::product::ProductView;

use super::{Order, OrderStatus, PaymentStatus};

/// Order as returned by the use cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub client: Option<ClientView>,
    pub products: Vec<ProductView>,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub waiting_time_in_minutes: i64,
    pub formatted_number: String,
    pub payment_qr_code_data: Option<String>,
    pub external_id: Option<String>,
}

impl OrderView {
    /// Builds the view, measuring waiting time up to `now`.
    pub fn new(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id(),
            payment_status: order.payment_status(),
            status: order.status(),
            client: order.client().map(ClientView::from),
            products: order.products().iter().map(ProductView::from).collect(),
            created_at: order.created_at(),
            total_amount: order.total_amount().as_decimal(),
            updated_at: order.updated_at(),
            finished_at: order.finished_at(),
            waiting_time_in_minutes: order.waiting_time_in_minutes(now),
            formatted_number: order.formatted_number(),
            payment_qr_code_data: order.payment_qr_code_data().map(String::from),
            external_id: order.payment_external_id().map(String::from),
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusView {
    pub id: OrderId,
    pub payment_status: PaymentStatus,
    pub payment_status_updated_at: Option<DateTime<Utc>>,
    pub is_payment_approved: bool,
}

impl From<&Order> for PaymentStatusView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            payment_status: order.payment_status(),
            payment_status_updated_at: order.payment_status_updated_at(),
            is_payment_approved: order.payment_status().is_payment_approved(),
        }
    }
}
