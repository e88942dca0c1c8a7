//! Order service implementing the order use cases on top of the ports.

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use common::{ClientId, OrderId, ProductId};

use crate::client::ClientService;
use crate::error::{DomainError, OrderLookup};
use crate::ports::{ClientRepository, OrderRepository, PaymentGateway, ProductRepository};
use crate::product::ProductService;

use super::{Order, OrderStatus, OrderView, PaymentStatusView};

/// Service for managing orders.
///
/// Each method is one use case. Mutations happen on a loaded copy of the
/// order and reach storage through a single `save_order` call, so a failing
/// transition leaves the stored order untouched.
pub struct OrderService<O, C, P, G>
where
    O: OrderRepository,
    C: ClientRepository,
    P: ProductRepository,
    G: PaymentGateway,
{
    orders: O,
    clients: ClientService<C>,
    products: ProductService<P>,
    payments: G,
}

impl<O, C, P, G> OrderService<O, C, P, G>
where
    O: OrderRepository,
    C: ClientRepository,
    P: ProductRepository,
    G: PaymentGateway,
{
    pub fn new(
        orders: O,
        clients: ClientService<C>,
        products: ProductService<P>,
        payments: G,
    ) -> Self {
        Self {
            orders,
            clients,
            products,
            payments,
        }
    }

    pub fn clients(&self) -> &ClientService<C> {
        &self.clients
    }

    pub fn products(&self) -> &ProductService<P> {
        &self.products
    }

    /// Creates an order, optionally identified by a client, and registers its payment.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        client_id: Option<ClientId>,
        product_ids: Vec<ProductId>,
    ) -> Result<OrderView, DomainError> {
        if product_ids.is_empty() {
            return Err(DomainError::InvalidOrderOperation(
                "an order needs at least one product".to_string(),
            ));
        }

        let mut order = self.create_order_with_products(&product_ids).await?;

        if let Some(client_id) = client_id {
            let client = self.clients.find_client_by_id(client_id).await?;
            order.identify_client(client)?;
        }

        let intent = self
            .payments
            .create_payment_intent(order.id(), order.total_amount())
            .await?;
        order.attach_payment_intent(intent)?;

        let persisted = self.orders.save_order(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %persisted.id(),
            number = %persisted.formatted_number(),
            with_client = client_id.is_some(),
            "order created"
        );

        Ok(OrderView::new(&persisted, Utc::now()))
    }

    /// Lists the kitchen queue. An empty queue is reported as `OrderNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn list_queued_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        let mut orders = self
            .orders
            .find_orders_by_status_in(OrderStatus::in_preparation())
            .await?;

        if orders.is_empty() {
            return Err(DomainError::OrderNotFound(OrderLookup::Message(
                "no orders in preparation".to_string(),
            )));
        }

        sort_by_queue_position(&mut orders);

        let now = Utc::now();
        Ok(orders.iter().map(|order| OrderView::new(order, now)).collect())
    }

    /// Approves the payment and sends the order to the kitchen.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, id: OrderId) -> Result<(), DomainError> {
        let mut order = self.get_order_by_id(id).await?;

        order.confirm_payment()?;
        order.send_to_preparation()?;
        self.orders.save_order(&order).await?;

        metrics::counter!("orders_payment_confirmed_total").increment(1);
        tracing::info!(order_id = %id, "order payment confirmed; order sent to preparation");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order_payment_status(
        &self,
        id: OrderId,
    ) -> Result<PaymentStatusView, DomainError> {
        let order = self.get_order_by_id(id).await?;
        Ok(PaymentStatusView::from(&order))
    }

    /// Moves an order to the status named `status`.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: &str,
    ) -> Result<OrderView, DomainError> {
        let target: OrderStatus = status.parse().map_err(|_| {
            DomainError::InvalidOrderOperation(format!("no order status named {status}"))
        })?;

        let mut order = self.get_order_by_id(id).await?;

        match target {
            OrderStatus::Preparing => order.start_preparation()?,
            OrderStatus::Ready => order.finish_preparation()?,
            OrderStatus::Received => order.deliver_to_client()?,
            OrderStatus::Finished => order.finish()?,
            OrderStatus::Cancelled => order.cancel()?,
            OrderStatus::Created | OrderStatus::PaymentPending | OrderStatus::PaymentConfirmed => {
                return Err(DomainError::InvalidOrderOperation(format!(
                    "cannot update order status to {target}"
                )));
            }
        }

        let persisted = self.orders.save_order(&order).await?;

        metrics::counter!("order_status_updates_total", "status" => target.as_str()).increment(1);
        tracing::info!(order_id = %id, status = %target, "order status updated");

        Ok(OrderView::new(&persisted, Utc::now()))
    }

    async fn create_order_with_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Order, DomainError> {
        let mut products = Vec::with_capacity(product_ids.len());
        for id in product_ids {
            products.push(self.products.find_product_by_id(*id).await?);
        }

        let (start, end) = local_day_bounds(Local::now());
        let orders_today = self.orders.count_orders_between(start, end).await?;

        Ok(Order::new(products, orders_today)?)
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .find_order_by_id(id)
            .await?
            .ok_or(DomainError::OrderNotFound(OrderLookup::Id(id)))
    }
}

/// Sorts orders for the queue display: presentation order ascending,
/// newest first among orders with the same status.
pub fn sort_by_queue_position(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        a.status()
            .presentation_order()
            .cmp(&b.status().presentation_order())
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });
}

/// First and last instant of the calendar day containing `now`, in UTC.
pub fn local_day_bounds<Tz: TimeZone>(now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let start = now.date_naive().and_time(NaiveTime::default());
    let end = start + Duration::days(1) - Duration::nanoseconds(1);
    (to_utc(&tz, start), to_utc(&tz, end))
}

fn to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight can fall in a DST gap; the naive time is close enough then.
        .unwrap_or_else(|| local.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::ports::PaymentIntent;

    fn order_in(status: OrderStatus, minutes_ago: i64) -> Order {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        let mut order = Order::new_at(Vec::new(), 0, created_at).unwrap();
        if status == OrderStatus::Created {
            return order;
        }
        order
            .attach_payment_intent(PaymentIntent {
                qr_code_data: "qr".to_string(),
                external_id: "ext".to_string(),
            })
            .unwrap();
        if status == OrderStatus::PaymentPending {
            return order;
        }
        order.confirm_payment().unwrap();
        order.send_to_preparation().unwrap();
        if status == OrderStatus::Preparing || status == OrderStatus::Ready {
            order.start_preparation().unwrap();
        }
        if status == OrderStatus::Ready {
            order.finish_preparation().unwrap();
        }
        order
    }

    #[test]
    fn test_queue_sorts_by_presentation_order_then_newest() {
        let mut orders = vec![
            order_in(OrderStatus::PaymentConfirmed, 5),
            order_in(OrderStatus::Preparing, 30),
            order_in(OrderStatus::Ready, 40),
            order_in(OrderStatus::Preparing, 10),
            order_in(OrderStatus::Ready, 20),
        ];
        let newest_ready = orders[4].id();
        let newest_preparing = orders[3].id();

        sort_by_queue_position(&mut orders);

        let statuses: Vec<_> = orders.iter().map(Order::status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Ready,
                OrderStatus::Ready,
                OrderStatus::Preparing,
                OrderStatus::Preparing,
                OrderStatus::PaymentConfirmed,
            ]
        );
        assert_eq!(orders[0].id(), newest_ready);
        assert_eq!(orders[2].id(), newest_preparing);
        assert!(orders[0].created_at() > orders[1].created_at());
    }

    #[test]
    fn test_local_day_bounds_in_fixed_offset() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();

        let (start, end) = local_day_bounds(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap());
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 5, 11, 3, 0, 0).unwrap() - Duration::nanoseconds(1)
        );
    }

    #[test]
    fn test_local_day_bounds_contain_now() {
        let now = Local::now();
        let (start, end) = local_day_bounds(now);
        let now = now.with_timezone(&Utc);
        assert!(start <= now && now <= end);
    }
}
