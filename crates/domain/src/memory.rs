//! In-memory adapters for every port.
//!
//! Used by tests and by the API when no database is configured. They follow
//! the same contracts as the PostgreSQL adapters, including the order
//! version check.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ClientId, OrderId, ProductId};
use tokio::sync::RwLock;

use crate::client::{Client, Cpf, NewClient};
use crate::order::{Money, Order, OrderStatus};
use crate::ports::{
    ClientRepository, OrderRepository, PaymentError, PaymentGateway, PaymentIntent,
    ProductRepository, RepositoryError,
};
use crate::product::{NewProduct, Product, ProductCategory};

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    clients: HashMap<ClientId, Client>,
    products: HashMap<ProductId, Product>,
    next_client_id: i64,
    next_product_id: i64,
}

/// In-memory store implementing the order, client and product repositories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Stores an order as-is, bypassing the version check.
    ///
    /// Lets tests seed orders with arbitrary timestamps.
    pub async fn insert_order(&self, order: Order) {
        self.tables.write().await.orders.insert(order.id(), order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn save_order(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;

        let current_version = tables
            .orders
            .get(&order.id())
            .map(Order::version)
            .unwrap_or(0);

        if current_version != order.version() {
            return Err(RepositoryError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: current_version,
            });
        }

        let mut saved = order.clone();
        saved.set_version(current_version + 1);
        tables.orders.insert(saved.id(), saved.clone());

        Ok(saved)
    }

    async fn find_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn find_orders_by_status_in(
        &self,
        statuses: &[OrderStatus],
    ) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|order| statuses.contains(&order.status()))
            .cloned()
            .collect())
    }

    async fn count_orders_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables
            .orders
            .values()
            .filter(|order| order.created_at() >= start && order.created_at() <= end)
            .count();
        Ok(count as u32)
    }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn save_client(&self, client: NewClient) -> Result<Client, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.clients.values().any(|c| c.cpf == client.cpf) {
            return Err(RepositoryError::Duplicate(format!("cpf {}", client.cpf)));
        }

        tables.next_client_id += 1;
        let client = Client {
            id: ClientId::new(tables.next_client_id),
            name: client.name,
            email: client.email,
            cpf: client.cpf,
            created_at: Utc::now(),
        };
        tables.clients.insert(client.id, client.clone());

        Ok(client)
    }

    async fn find_client_by_id(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn find_client_by_cpf(&self, cpf: &Cpf) -> Result<Option<Client>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.values().find(|c| &c.cpf == cpf).cloned())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn save_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;

        tables.next_product_id += 1;
        let product = Product {
            id: ProductId::new(tables.next_product_id),
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());

        Ok(product)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_products_by_category(
        &self,
        category: ProductCategory,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}

#[derive(Debug, Default)]
struct PaymentLedger {
    intents: Vec<(OrderId, Money, PaymentIntent)>,
    fail_next: bool,
}

/// Payment gateway that records every intent it issues.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    ledger: Arc<RwLock<PaymentLedger>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create_payment_intent` call fail.
    pub async fn fail_next(&self) {
        self.ledger.write().await.fail_next = true;
    }

    /// Returns the intents issued so far with the order and amount they were issued for.
    pub async fn intents(&self) -> Vec<(OrderId, Money, PaymentIntent)> {
        self.ledger.read().await.intents.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment_intent(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut ledger = self.ledger.write().await;

        if ledger.fail_next {
            ledger.fail_next = false;
            return Err(PaymentError::Unavailable("payment provider offline".to_string()));
        }

        let sequence = ledger.intents.len() + 1;
        let intent = PaymentIntent {
            qr_code_data: format!("qr:{order_id}:{amount}"),
            external_id: format!("PAY-{sequence:04}"),
        };
        ledger.intents.push((order_id, amount, intent.clone()));

        Ok(intent)
    }
}
