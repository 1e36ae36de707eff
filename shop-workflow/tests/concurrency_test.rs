//! Concurrent order placement against the in-memory store.
//!
//! Orders race on a multi-threaded runtime; the stock invariant must hold
//! no matter how they interleave.

use rust_decimal_macros::dec;
use shop_domain::{NewOrder, Quantity};
use shop_store::MemoryStore;
use shop_testkit::{order_count, product_stock, seed_product, seed_user};
use shop_workflow::{OrderError, OrderService};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_sold_once() {
    let store = Arc::new(MemoryStore::new());
    let user = seed_user(store.as_ref(), "ada").await.unwrap();
    let product = seed_product(store.as_ref(), dec!(10), 1).await.unwrap();
    let service = OrderService::new(store.clone());

    let request = NewOrder {
        customer_id: user.id,
        product_id: product.id,
        quantity: Quantity::new(1).unwrap(),
    };

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.create_order(request).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.create_order(request).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(OrderError::InsufficientStock { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(rejected, 1);
    assert_eq!(product_stock(store.as_ref(), product.id).await.unwrap(), Some(0));
    assert_eq!(order_count(store.as_ref()).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell() {
    const INITIAL_STOCK: u32 = 25;

    let store = Arc::new(MemoryStore::new());
    let user = seed_user(store.as_ref(), "ada").await.unwrap();
    let product = seed_product(store.as_ref(), dec!(1.50), INITIAL_STOCK).await.unwrap();
    let service = OrderService::new(store.clone());

    // 40 orders of 1, 2 or 3 units: 80 units requested against 25 in stock
    let handles: Vec<_> = (0..40u32)
        .map(|i| {
            let service = service.clone();
            let request = NewOrder {
                customer_id: user.id,
                product_id: product.id,
                quantity: Quantity::new(i % 3 + 1).unwrap(),
            };
            tokio::spawn(async move { service.create_order(request).await })
        })
        .collect();

    let mut sold = 0u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => sold += order.quantity.get(),
            Err(OrderError::InsufficientStock { .. }) => {},
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let remaining = product_stock(store.as_ref(), product.id).await.unwrap().unwrap();
    assert!(sold <= INITIAL_STOCK);
    assert_eq!(sold + remaining, INITIAL_STOCK);

    let orders = service.list_orders().await.unwrap();
    let recorded: u32 = orders.iter().map(|o| o.quantity.get()).sum();
    assert_eq!(recorded, sold);
}

#[tokio::test]
async fn test_failed_order_does_not_block_later_orders() {
    let store = Arc::new(MemoryStore::new());
    let user = seed_user(store.as_ref(), "ada").await.unwrap();
    let product = seed_product(store.as_ref(), dec!(4), 2).await.unwrap();
    let service = OrderService::new(store.clone());

    let too_many = NewOrder {
        customer_id: user.id,
        product_id: product.id,
        quantity: Quantity::new(5).unwrap(),
    };
    assert!(service.create_order(too_many).await.is_err());

    let fits = NewOrder {
        quantity: Quantity::new(2).unwrap(),
        ..too_many
    };
    let order = service.create_order(fits).await.unwrap();

    assert_eq!(order.total_price, dec!(8));
    assert_eq!(product_stock(store.as_ref(), product.id).await.unwrap(), Some(0));
}
