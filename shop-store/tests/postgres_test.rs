//! Integration tests for the PostgreSQL store.
//!
//! Run with: `cargo test -p shop-store --features postgres`

#![cfg(feature = "postgres")]

use futures_util::FutureExt;
use rust_decimal_macros::dec;
use shop_domain::{NewOrder, NewProduct, NewUser, Order, Price, Product, ProductId, Quantity, User};
use shop_store::{PgStore, StoreError, UnitOfWork};
use std::time::Duration;
use tokio::sync::oneshot;

async fn seed(store: &PgStore, stock: u32) -> (User, Product) {
    let user = User::new(NewUser {
        username: "ada".to_string(),
        email: "ada@example.com".to_string(),
    });
    let product = Product::new(NewProduct {
        name: "Lamp".to_string(),
        description: "Desk lamp".to_string(),
        price: Price::new(dec!(19.99)).unwrap(),
        stock,
    });

    store
        .execute(move |tx| {
            async move {
                let user = tx.users().create(&user).await?;
                let product = tx.products().create(&product).await?;
                Ok::<_, StoreError>((user, product))
            }
            .boxed()
        })
        .await
        .unwrap()
}

async fn stock_of(store: &PgStore, id: ProductId) -> Option<u32> {
    store
        .execute(move |tx| {
            async move {
                let product = tx.products().find_by_id(id).await?;
                Ok::<_, StoreError>(product.map(|p| p.stock))
            }
            .boxed()
        })
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../migrations")]
async fn test_round_trip_and_soft_delete(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (user, product) = seed(&store, 5).await;

    let found = store
        .execute(move |tx| async move { tx.products().find_by_id(product.id).await }.boxed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.price.as_decimal(), dec!(19.99));
    assert_eq!(found.stock, 5);

    store
        .execute(move |tx| async move { tx.users().delete(user.id).await }.boxed())
        .await
        .unwrap();

    let users = store
        .execute(|tx| async move { tx.users().list().await }.boxed())
        .await
        .unwrap();
    assert!(users.is_empty());

    let again: Result<(), StoreError> = store
        .execute(move |tx| async move { tx.users().delete(user.id).await }.boxed())
        .await;
    assert!(again.unwrap_err().is_not_found());
}

#[sqlx::test(migrations = "../migrations")]
async fn test_error_rolls_back_all_writes(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (user, product) = seed(&store, 5).await;

    let result: Result<(), StoreError> = store
        .execute(move |tx| {
            async move {
                let mut locked = tx.products().find_by_id_for_update(product.id).await?.unwrap();
                let quantity = Quantity::new(2)?;
                locked.reserve(quantity)?;
                tx.products().update(&locked).await?;

                let request = NewOrder {
                    customer_id: user.id,
                    product_id: locked.id,
                    quantity,
                };
                tx.orders().create(&Order::place(request, &locked)?).await?;
                Err(StoreError::Database("abort after writes".to_string()))
            }
            .boxed()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(stock_of(&store, product.id).await, Some(5));

    let orders = store
        .execute(|tx| async move { tx.orders().list().await }.boxed())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[sqlx::test(migrations = "../migrations")]
async fn test_for_update_serializes_decrements(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (_, product) = seed(&store, 1).await;
    let id = product.id;

    let take = move |store: PgStore| async move {
        store
            .execute(move |tx| {
                async move {
                    let mut product = tx.products().find_by_id_for_update(id).await?.unwrap();
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    product.reserve(Quantity::new(1)?)?;
                    tx.products().update(&product).await?;
                    Ok::<_, StoreError>(())
                }
                .boxed()
            })
            .await
    };

    let first = tokio::spawn(take(store.clone()));
    let second = tokio::spawn(take(store.clone()));
    let results = [first.await.unwrap(), second.await.unwrap()];

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let short = results
        .iter()
        .filter(|r| {
            matches!(r, Err(StoreError::Domain(shop_domain::DomainError::InsufficientStock { .. })))
        })
        .count();

    assert_eq!(ok, 1);
    assert_eq!(short, 1);
    assert_eq!(stock_of(&store, id).await, Some(0));
}

#[sqlx::test(migrations = "../migrations")]
async fn test_update_missing_product(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let ghost = Product::new(NewProduct {
        name: "Ghost".to_string(),
        description: String::new(),
        price: Price::new(dec!(1)).unwrap(),
        stock: 1,
    });

    let result = store
        .execute(move |tx| async move { tx.products().update(&ghost).await }.boxed())
        .await;
    assert!(result.unwrap_err().is_not_found());
}

#[sqlx::test(migrations = "../migrations")]
async fn test_share_locked_customer_outlives_concurrent_delete(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (user, product) = seed(&store, 5).await;
    let user_id = user.id;
    let (locked_tx, locked_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    // Reads the customer with a share lock, then records an order once released
    let ordering = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .execute(move |tx| {
                    async move {
                        let customer = tx.users().find_by_id_for_share(user_id).await?;
                        assert!(customer.is_some());
                        let _ = locked_tx.send(());
                        let _ = release_rx.await;

                        let request = NewOrder {
                            customer_id: user_id,
                            product_id: product.id,
                            quantity: Quantity::new(1)?,
                        };
                        tx.orders().create(&Order::place(request, &product)?).await?;
                        Ok::<_, StoreError>(())
                    }
                    .boxed()
                })
                .await
        }
    });
    locked_rx.await.unwrap();

    let deleting = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .execute(move |tx| async move { tx.users().delete(user_id).await }.boxed())
                .await
        }
    });

    // The delete waits for the order's transaction
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!deleting.is_finished());

    release_tx.send(()).unwrap();
    ordering.await.unwrap().unwrap();
    deleting.await.unwrap().unwrap();

    let orders = store
        .execute(|tx| async move { tx.orders().list().await }.boxed())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].customer_id, user_id);
}

#[sqlx::test(migrations = "../migrations")]
async fn test_share_lock_sees_committed_delete(pool: sqlx::PgPool) {
    let store = PgStore::new(pool);
    let (user, _) = seed(&store, 5).await;
    let user_id = user.id;
    let (deleted_tx, deleted_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    // Soft-deletes the customer and holds the transaction open until released
    let deleting = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .execute(move |tx| {
                    async move {
                        tx.users().delete(user_id).await?;
                        let _ = deleted_tx.send(());
                        let _ = release_rx.await;
                        Ok::<_, StoreError>(())
                    }
                    .boxed()
                })
                .await
        }
    });
    deleted_rx.await.unwrap();

    let reading = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .execute(move |tx| {
                    async move { tx.users().find_by_id_for_share(user_id).await }.boxed()
                })
                .await
        }
    });

    // The locked read waits for the delete to finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!reading.is_finished());

    release_tx.send(()).unwrap();
    deleting.await.unwrap().unwrap();

    // Re-checked against the committed row: the customer is gone
    let customer = reading.await.unwrap().unwrap();
    assert!(customer.is_none());
}
