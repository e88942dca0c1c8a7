//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::ports::PaymentIntent;
use crate::product::Product;

use super::{Money, OrderError, OrderStatus, PaymentStatus};

/// Order aggregate root.
///
/// Represents a fast-food order from the moment the products are picked
/// until it is handed to the client or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,

    /// Sequential number of the order within its calendar day.
    number: u32,

    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_status_updated_at: Option<DateTime<Utc>>,

    client: Option<Client>,

    /// Products in the order, in the order they were picked.
    products: Vec<Product>,

    total_amount: Money,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,

    payment_qr_code_data: Option<String>,
    payment_external_id: Option<String>,

    /// Current version for optimistic concurrency. Zero until first saved.
    #[serde(default)]
    version: u64,
}

/// Every stored field of an order, used by persistence adapters to rebuild it.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub number: u32,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_status_updated_at: Option<DateTime<Utc>>,
    pub client: Option<Client>,
    pub products: Vec<Product>,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub payment_qr_code_data: Option<String>,
    pub payment_external_id: Option<String>,
    pub version: u64,
}

impl Order {
    /// Builds a new order from its products.
    ///
    /// `orders_today` is the number of orders already created in the current
    /// calendar day; the new order takes the next number.
    ///
    /// Fails with `TotalOverflow` when the prices do not add up to a valid amount.
    pub fn new(products: Vec<Product>, orders_today: u32) -> Result<Self, OrderError> {
        Self::new_at(products, orders_today, Utc::now())
    }

    /// Same as [`Order::new`] with an explicit creation time.
    pub fn new_at(
        products: Vec<Product>,
        orders_today: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let total_amount = Money::checked_sum(products.iter().map(|p| p.price))
            .ok_or(OrderError::TotalOverflow)?;
        Ok(Self {
            id: OrderId::new(),
            number: orders_today + 1,
            status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            payment_status_updated_at: None,
            client: None,
            products,
            total_amount,
            created_at: now,
            updated_at: now,
            finished_at: None,
            payment_qr_code_data: None,
            payment_external_id: None,
            version: 0,
        })
    }

    /// Rebuilds an order from storage.
    pub fn from_record(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            number: record.number,
            status: record.status,
            payment_status: record.payment_status,
            payment_status_updated_at: record.payment_status_updated_at,
            client: record.client,
            products: record.products,
            total_amount: record.total_amount,
            created_at: record.created_at,
            updated_at: record.updated_at,
            finished_at: record.finished_at,
            payment_qr_code_data: record.payment_qr_code_data,
            payment_external_id: record.payment_external_id,
            version: record.version,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns the order number zero-padded to three digits, as shown on screens.
    pub fn formatted_number(&self) -> String {
        format!("{:03}", self.number)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_status_updated_at(&self) -> Option<DateTime<Utc>> {
        self.payment_status_updated_at
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn payment_qr_code_data(&self) -> Option<&str> {
        self.payment_qr_code_data.as_deref()
    }

    pub fn payment_external_id(&self) -> Option<&str> {
        self.payment_external_id.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Used by persistence adapters after a successful save.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Minutes the client has waited: until the order closed, or until `now`.
    pub fn waiting_time_in_minutes(&self, now: DateTime<Utc>) -> i64 {
        let end = self.finished_at.unwrap_or(now);
        (end - self.created_at).num_minutes().max(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Lifecycle transitions
impl Order {
    /// Attaches the client who placed the order.
    pub fn identify_client(&mut self, client: Client) -> Result<(), OrderError> {
        self.ensure(self.status == OrderStatus::Created, "identify client")?;
        self.client = Some(client);
        self.touch();
        Ok(())
    }

    /// Stores the payment provider data and starts waiting for payment.
    pub fn attach_payment_intent(&mut self, intent: PaymentIntent) -> Result<(), OrderError> {
        self.ensure(self.status.can_await_payment(), "attach payment intent")?;
        self.payment_qr_code_data = Some(intent.qr_code_data);
        self.payment_external_id = Some(intent.external_id);
        self.status = OrderStatus::PaymentPending;
        self.touch();
        Ok(())
    }

    /// Marks the payment as approved.
    pub fn confirm_payment(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_confirm_payment(), "confirm payment")?;
        self.ensure_payment(self.payment_status.is_pending(), "confirm payment")?;
        let now = Utc::now();
        self.payment_status = PaymentStatus::Approved;
        self.payment_status_updated_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Puts a paid order in the kitchen queue.
    pub fn send_to_preparation(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_confirm_payment(), "send to preparation")?;
        self.ensure_payment(
            self.payment_status.is_payment_approved(),
            "send to preparation",
        )?;
        self.status = OrderStatus::PaymentConfirmed;
        self.touch();
        Ok(())
    }

    pub fn start_preparation(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_start_preparation(), "start preparation")?;
        self.status = OrderStatus::Preparing;
        self.touch();
        Ok(())
    }

    pub fn finish_preparation(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_finish_preparation(), "finish preparation")?;
        self.status = OrderStatus::Ready;
        self.touch();
        Ok(())
    }

    pub fn deliver_to_client(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_deliver(), "deliver to client")?;
        self.status = OrderStatus::Received;
        self.touch();
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_finish(), "finish")?;
        let now = Utc::now();
        self.status = OrderStatus::Finished;
        self.finished_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the order. A payment still pending is refused.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.ensure(self.status.can_cancel(), "cancel")?;
        let now = Utc::now();
        if self.payment_status.is_pending() {
            self.payment_status = PaymentStatus::Refused;
            self.payment_status_updated_at = Some(now);
        }
        self.status = OrderStatus::Cancelled;
        self.finished_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), OrderError> {
        if allowed {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action,
            })
        }
    }

    fn ensure_payment(&self, allowed: bool, action: &'static str) -> Result<(), OrderError> {
        if allowed {
            Ok(())
        } else {
            Err(OrderError::InvalidPaymentState {
                payment_status: self.payment_status,
                action,
            })
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
