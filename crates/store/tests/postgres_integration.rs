//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{
    Client, ClientRepository, Cpf, Money, NewClient, NewProduct, Order, OrderRepository,
    OrderStatus, PaymentIntent, PaymentStatus, Product, ProductCategory, ProductRepository,
    RepositoryError,
};
use serial_test::serial;
use sqlx::PgPool;
use store::PostgresStore;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // raw_sql executes every statement of the migration file
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_order_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let store = PostgresStore::connect(&info.connection_string, 5)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_products, orders, products, clients RESTART IDENTITY")
        .execute(store.pool())
        .await
        .unwrap();

    store
}

async fn seed_product(store: &PostgresStore, name: &str, cents: i64) -> Product {
    store
        .save_product(
            NewProduct::new(name, "", ProductCategory::Snack, Money::from_cents(cents)).unwrap(),
        )
        .await
        .unwrap()
}

fn pending_order(products: Vec<Product>) -> Order {
    pending_order_for(products, None)
}

fn pending_order_for(products: Vec<Product>, client: Option<Client>) -> Order {
    let mut order = Order::new(products, 0).unwrap();
    if let Some(client) = client {
        order.identify_client(client).unwrap();
    }
    order
        .attach_payment_intent(PaymentIntent {
            qr_code_data: "qr-data".to_string(),
            external_id: "ext-1".to_string(),
        })
        .unwrap();
    order
}

#[tokio::test]
#[serial]
async fn save_and_load_order_round_trip() {
    let store = get_test_store().await;
    let burger = seed_product(&store, "X-Burger", 1000).await;
    let soda = seed_product(&store, "Soda", 500).await;
    let client = store
        .save_client(NewClient::new("Ana", "ana@example.com", "529.982.247-25").unwrap())
        .await
        .unwrap();

    let mut order = Order::new(vec![burger.clone(), soda, burger], 0).unwrap();
    order.identify_client(client.clone()).unwrap();
    order
        .attach_payment_intent(PaymentIntent {
            qr_code_data: "qr-data".to_string(),
            external_id: "ext-1".to_string(),
        })
        .unwrap();

    let saved = store.save_order(&order).await.unwrap();
    assert_eq!(saved.version(), 1);

    let loaded = store.find_order_by_id(saved.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), OrderStatus::PaymentPending);
    assert_eq!(loaded.payment_status(), PaymentStatus::Pending);
    assert_eq!(loaded.total_amount(), Money::from_cents(2500));
    assert_eq!(loaded.client().map(|c| c.id), Some(client.id));
    assert_eq!(loaded.payment_external_id(), Some("ext-1"));
    assert_eq!(loaded.version(), 1);

    let names: Vec<_> = loaded.products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["X-Burger", "Soda", "X-Burger"]);
}

#[tokio::test]
#[serial]
async fn missing_order_is_none() {
    let store = get_test_store().await;

    let found = store.find_order_by_id(common::OrderId::new()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
#[serial]
async fn update_bumps_version_and_persists_status() {
    let store = get_test_store().await;
    let burger = seed_product(&store, "X-Burger", 1000).await;

    let mut saved = store.save_order(&pending_order(vec![burger])).await.unwrap();
    saved.confirm_payment().unwrap();
    saved.send_to_preparation().unwrap();

    let updated = store.save_order(&saved).await.unwrap();
    assert_eq!(updated.version(), 2);

    let loaded = store.find_order_by_id(updated.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), OrderStatus::PaymentConfirmed);
    assert_eq!(loaded.payment_status(), PaymentStatus::Approved);
    assert!(loaded.payment_status_updated_at().is_some());
}

#[tokio::test]
#[serial]
async fn stale_update_is_a_concurrency_conflict() {
    let store = get_test_store().await;
    let burger = seed_product(&store, "X-Burger", 1000).await;

    let saved = store.save_order(&pending_order(vec![burger])).await.unwrap();

    let mut first = saved.clone();
    first.cancel().unwrap();
    store.save_order(&first).await.unwrap();

    let mut second = saved;
    second.confirm_payment().unwrap();
    let err = store.save_order(&second).await.unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
}

#[tokio::test]
#[serial]
async fn find_orders_by_status_filters() {
    let store = get_test_store().await;
    let burger = seed_product(&store, "X-Burger", 1000).await;

    store
        .save_order(&Order::new(vec![burger.clone()], 0).unwrap())
        .await
        .unwrap();
    store
        .save_order(&pending_order(vec![burger.clone()]))
        .await
        .unwrap();
    let mut confirmed = pending_order(vec![burger]);
    confirmed.confirm_payment().unwrap();
    confirmed.send_to_preparation().unwrap();
    store.save_order(&confirmed).await.unwrap();

    let queued = store
        .find_orders_by_status_in(OrderStatus::in_preparation())
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id(), confirmed.id());

    let open = store
        .find_orders_by_status_in(&[OrderStatus::Created, OrderStatus::PaymentPending])
        .await
        .unwrap();
    assert_eq!(open.len(), 2);
}

#[tokio::test]
#[serial]
async fn listed_orders_keep_their_own_lines_and_clients() {
    let store = get_test_store().await;
    let burger = seed_product(&store, "X-Burger", 1000).await;
    let soda = seed_product(&store, "Soda", 500).await;
    let fries = seed_product(&store, "Fries", 700).await;
    let ana = store
        .save_client(NewClient::new("Ana", "ana@example.com", "52998224725").unwrap())
        .await
        .unwrap();
    let bruno = store
        .save_client(NewClient::new("Bruno", "bruno@example.com", "11144477735").unwrap())
        .await
        .unwrap();

    let first = pending_order_for(vec![burger.clone(), soda.clone()], Some(ana));
    let second = pending_order_for(vec![fries, burger], Some(bruno));
    let third = pending_order(vec![soda]);
    for order in [&first, &second, &third] {
        store.save_order(order).await.unwrap();
    }

    let listed = store
        .find_orders_by_status_in(&[OrderStatus::PaymentPending])
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);

    let summary = |id| {
        let order = listed.iter().find(|o| o.id() == id).unwrap();
        let names: Vec<_> = order.products().iter().map(|p| p.name.clone()).collect();
        (names, order.client().map(|c| c.name.clone()))
    };
    assert_eq!(
        summary(first.id()),
        (vec!["X-Burger".to_string(), "Soda".to_string()], Some("Ana".to_string()))
    );
    assert_eq!(
        summary(second.id()),
        (vec!["Fries".to_string(), "X-Burger".to_string()], Some("Bruno".to_string()))
    );
    assert_eq!(summary(third.id()), (vec!["Soda".to_string()], None));
}

#[tokio::test]
#[serial]
async fn count_orders_between_uses_creation_time() {
    let store = get_test_store().await;
    let now = Utc::now();

    store
        .save_order(&Order::new_at(Vec::new(), 0, now).unwrap())
        .await
        .unwrap();
    store
        .save_order(&Order::new_at(Vec::new(), 0, now - Duration::days(2)).unwrap())
        .await
        .unwrap();

    let today = store
        .count_orders_between(now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(today, 1);

    let all = store
        .count_orders_between(now - Duration::days(3), now + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(all, 2);
}

#[tokio::test]
#[serial]
async fn client_lookup_by_id_and_cpf() {
    let store = get_test_store().await;

    let saved = store
        .save_client(NewClient::new("Ana", "Ana@Example.com", "529.982.247-25").unwrap())
        .await
        .unwrap();
    assert_eq!(saved.email, "ana@example.com");

    let by_id = store.find_client_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(by_id.name, "Ana");

    let cpf = Cpf::parse("52998224725").unwrap();
    let by_cpf = store.find_client_by_cpf(&cpf).await.unwrap().unwrap();
    assert_eq!(by_cpf.id, saved.id);
}

#[tokio::test]
#[serial]
async fn duplicate_cpf_is_rejected() {
    let store = get_test_store().await;
    let client = NewClient::new("Ana", "ana@example.com", "52998224725").unwrap();

    store.save_client(client.clone()).await.unwrap();
    let err = store.save_client(client).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Duplicate(_)));
}

#[tokio::test]
#[serial]
async fn products_are_listed_by_category() {
    let store = get_test_store().await;

    let burger = seed_product(&store, "X-Burger", 1000).await;
    store
        .save_product(
            NewProduct::new("Soda", "350ml", ProductCategory::Drink, Money::from_cents(500))
                .unwrap(),
        )
        .await
        .unwrap();
    let salad = seed_product(&store, "X-Salad", 1200).await;

    let snacks = store
        .find_products_by_category(ProductCategory::Snack)
        .await
        .unwrap();
    let ids: Vec<_> = snacks.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![burger.id, salad.id]);

    let drinks = store
        .find_products_by_category(ProductCategory::Drink)
        .await
        .unwrap();
    assert_eq!(drinks.len(), 1);
    assert_eq!(drinks[0].description, "350ml");
    assert_eq!(drinks[0].price, Money::from_cents(500));

    let desserts = store
        .find_products_by_category(ProductCategory::Dessert)
        .await
        .unwrap();
    assert!(desserts.is_empty());
}
