use chrono::{Duration, Utc};
use common::ProductId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::order::sort_by_queue_position;
use domain::{
    ClientService, InMemoryPaymentGateway, InMemoryStore, Money, NewProduct, Order, OrderService,
    PaymentIntent, ProductCategory, ProductService,
};

fn queued_order(minutes_ago: i64, steps: usize) -> Order {
    let created_at = Utc::now() - Duration::minutes(minutes_ago);
    let mut order = Order::new_at(Vec::new(), 0, created_at).unwrap();
    order
        .attach_payment_intent(PaymentIntent {
            qr_code_data: "qr".to_string(),
            external_id: "ext".to_string(),
        })
        .unwrap();
    order.confirm_payment().unwrap();
    order.send_to_preparation().unwrap();
    if steps > 0 {
        order.start_preparation().unwrap();
    }
    if steps > 1 {
        order.finish_preparation().unwrap();
    }
    order
}

fn bench_sort_queue(c: &mut Criterion) {
    let orders: Vec<Order> = (0..500).map(|i| queued_order(i, (i % 3) as usize)).collect();

    c.bench_function("domain/sort_queue_500", |b| {
        b.iter(|| {
            let mut queue = orders.clone();
            sort_by_queue_position(&mut queue);
            queue
        });
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let service = OrderService::new(
        store.clone(),
        ClientService::new(store.clone()),
        ProductService::new(store.clone()),
        InMemoryPaymentGateway::new(),
    );
    rt.block_on(async {
        service
            .products()
            .create_product(
                NewProduct::new("X-Burger", "", ProductCategory::Snack, Money::from_cents(1000))
                    .unwrap(),
            )
            .await
            .unwrap();
    });

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(None, vec![ProductId::new(1), ProductId::new(1)])
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_sort_queue, bench_create_order);
criterion_main!(benches);
