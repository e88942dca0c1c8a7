use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ClientId, OrderId, ProductId};
use domain::{
    Client, ClientRepository, Cpf, Money, NewClient, NewProduct, Order, OrderRecord,
    OrderRepository, OrderStatus, PaymentStatus, Product, ProductCategory, ProductRepository,
    RepositoryError,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{Result, StoreError};

const ORDER_COLUMNS: &str = "id, number, status, payment_status, payment_status_updated_at, \
     client_id, total_amount_cents, created_at, updated_at, finished_at, \
     payment_qr_code_data, payment_external_id, version";

/// PostgreSQL-backed implementation of the order, client and product repositories.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a pool of at most `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_client(row: &PgRow) -> Result<Client> {
        let cpf: String = row.try_get("cpf")?;
        Ok(Client {
            id: ClientId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            cpf: Cpf::parse(&cpf).map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let category: String = row.try_get("category")?;
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: category
                .parse::<ProductCategory>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            price: Money::from_cents(row.try_get("price_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }

    async fn fetch_client(&self, id: i64) -> Result<Option<Client>> {
        let row = sqlx::query("SELECT id, name, email, cpf, created_at FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_client).transpose()
    }

    /// Opens a read-only snapshot so an order and its lines are read consistently.
    async fn begin_read(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn fetch_order_lines(
        tx: &mut Transaction<'_, Postgres>,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Product>>> {
        let rows = sqlx::query(
            r#"
            SELECT op.order_id, p.id, p.name, p.description, p.category, p.price_cents,
                   p.created_at
            FROM order_products op
            JOIN products p ON p.id = op.product_id
            WHERE op.order_id = ANY($1)
            ORDER BY op.order_id, op.position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&mut **tx)
        .await?;

        let mut lines: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines
                .entry(order_id)
                .or_default()
                .push(Self::row_to_product(row)?);
        }
        Ok(lines)
    }

    async fn fetch_clients(
        tx: &mut Transaction<'_, Postgres>,
        client_ids: &[i64],
    ) -> Result<HashMap<i64, Client>> {
        if client_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows =
            sqlx::query("SELECT id, name, email, cpf, created_at FROM clients WHERE id = ANY($1)")
                .bind(client_ids)
                .fetch_all(&mut **tx)
                .await?;

        rows.iter()
            .map(|row| Self::row_to_client(row).map(|c| (c.id.as_i64(), c)))
            .collect()
    }

    fn row_to_order(
        row: &PgRow,
        lines: &mut HashMap<Uuid, Vec<Product>>,
        clients: &HashMap<i64, Client>,
    ) -> Result<Order> {
        let id: Uuid = row.try_get("id")?;
        let number: i32 = row.try_get("number")?;
        let version: i64 = row.try_get("version")?;
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;
        let client_id: Option<i64> = row.try_get("client_id")?;

        Ok(Order::from_record(OrderRecord {
            id: OrderId::from_uuid(id),
            number: number as u32,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_status_updated_at: row.try_get("payment_status_updated_at")?,
            client: client_id.and_then(|cid| clients.get(&cid).cloned()),
            products: lines.remove(&id).unwrap_or_default(),
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            finished_at: row.try_get("finished_at")?,
            payment_qr_code_data: row.try_get("payment_qr_code_data")?,
            payment_external_id: row.try_get("payment_external_id")?,
            version: version as u64,
        }))
    }

    async fn insert_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, number, status, payment_status, payment_status_updated_at,
                                client_id, total_amount_cents, created_at, updated_at, finished_at,
                                payment_qr_code_data, payment_external_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.number() as i32)
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.payment_status_updated_at())
        .bind(order.client().map(|c| c.id.as_i64()))
        .bind(order.total_amount().cents())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.finished_at())
        .bind(order.payment_qr_code_data())
        .bind(order.payment_external_id())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            // A second insert of the same order lost a race with the first.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::ConcurrencyConflict {
                    order_id: order.id(),
                    expected: 0,
                    actual: 1,
                };
            }
            StoreError::Database(e)
        })?;

        for (position, product) in order.products().iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_products (order_id, position, product_id) VALUES ($1, $2, $3)",
            )
            .bind(order.id().as_uuid())
            .bind(position as i32)
            .bind(product.id.as_i64())
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn update_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3,
                payment_status = $4,
                payment_status_updated_at = $5,
                client_id = $6,
                updated_at = $7,
                finished_at = $8,
                payment_qr_code_data = $9,
                payment_external_id = $10,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.version() as i64)
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.payment_status_updated_at())
        .bind(order.client().map(|c| c.id.as_i64()))
        .bind(order.updated_at())
        .bind(order.finished_at())
        .bind(order.payment_qr_code_data())
        .bind(order.payment_external_id())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                    .bind(order.id().as_uuid())
                    .fetch_optional(&mut **tx)
                    .await?;

            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: actual.unwrap_or(0) as u64,
            });
        }

        Ok(())
    }

    async fn write_order(&self, order: &Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        if order.version() == 0 {
            Self::insert_order(&mut tx, order).await?;
        } else {
            Self::update_order(&mut tx, order).await?;
        }

        tx.commit().await?;

        let mut saved = order.clone();
        saved.set_version(order.version() + 1);
        Ok(saved)
    }

    /// Attaches lines and clients to order rows with one query per table.
    async fn load_orders(
        tx: &mut Transaction<'_, Postgres>,
        rows: Vec<PgRow>,
    ) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut client_ids = rows
            .iter()
            .filter_map(|row| row.try_get::<Option<i64>, _>("client_id").transpose())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        client_ids.sort_unstable();
        client_ids.dedup();

        let mut lines = Self::fetch_order_lines(tx, &order_ids).await?;
        let clients = Self::fetch_clients(tx, &client_ids).await?;

        rows.iter()
            .map(|row| Self::row_to_order(row, &mut lines, &clients))
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn save_order(&self, order: &Order) -> std::result::Result<Order, RepositoryError> {
        let saved = self.write_order(order).await?;
        tracing::debug!(order_id = %saved.id(), version = saved.version(), "order saved");
        Ok(saved)
    }

    async fn find_order_by_id(
        &self,
        id: OrderId,
    ) -> std::result::Result<Option<Order>, RepositoryError> {
        let mut tx = self.begin_read().await?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let orders = Self::load_orders(&mut tx, row.into_iter().collect()).await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(orders.into_iter().next())
    }

    async fn find_orders_by_status_in(
        &self,
        statuses: &[OrderStatus],
    ) -> std::result::Result<Vec<Order>, RepositoryError> {
        let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let mut tx = self.begin_read().await?;
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ANY($1)"
        ))
        .bind(names)
        .fetch_all(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let orders = Self::load_orders(&mut tx, rows).await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(orders)
    }

    async fn count_orders_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<u32, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at BETWEEN $1 AND $2")
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::from)?;

        Ok(count as u32)
    }
}

#[async_trait]
impl ClientRepository for PostgresStore {
    async fn save_client(&self, client: NewClient) -> std::result::Result<Client, RepositoryError> {
        let cpf = client.cpf.to_string();
        let row = sqlx::query(
            r#"
            INSERT INTO clients (name, email, cpf)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, cpf, created_at
            "#,
        )
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.cpf.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("clients_cpf_key")
            {
                return StoreError::DuplicateCpf(cpf.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(Self::row_to_client(&row)?)
    }

    async fn find_client_by_id(
        &self,
        id: ClientId,
    ) -> std::result::Result<Option<Client>, RepositoryError> {
        Ok(self.fetch_client(id.as_i64()).await?)
    }

    async fn find_client_by_cpf(
        &self,
        cpf: &Cpf,
    ) -> std::result::Result<Option<Client>, RepositoryError> {
        let row =
            sqlx::query("SELECT id, name, email, cpf, created_at FROM clients WHERE cpf = $1")
                .bind(cpf.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from)?;

        Ok(row.as_ref().map(Self::row_to_client).transpose()?)
    }
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn save_product(
        &self,
        product: NewProduct,
    ) -> std::result::Result<Product, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, category, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, category, price_cents, created_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category.as_str())
        .bind(product.price.cents())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(Self::row_to_product(&row)?)
    }

    async fn find_product_by_id(
        &self,
        id: ProductId,
    ) -> std::result::Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, category, price_cents, created_at \
             FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(row.as_ref().map(Self::row_to_product).transpose()?)
    }

    async fn find_products_by_category(
        &self,
        category: ProductCategory,
    ) -> std::result::Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, category, price_cents, created_at \
             FROM products WHERE category = $1 ORDER BY id ASC",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?)
    }
}
