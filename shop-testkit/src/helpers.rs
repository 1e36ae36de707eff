//! Test helper functions for store seeding.

use futures_util::FutureExt;
use rust_decimal::Decimal;
use shop_domain::{NewProduct, NewUser, Price, Product, ProductId, User};
use shop_store::{StoreError, UnitOfWork};

use crate::Result;

/// Seed a user named `username` (email `<username>@example.com`).
pub async fn seed_user<U: UnitOfWork>(uow: &U, username: &str) -> Result<User> {
    let user = User::new(NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
    });

    let user = uow
        .execute(move |tx| async move { tx.users().create(&user).await }.boxed())
        .await?;
    Ok(user)
}

/// Seed a product with the given unit price and stock.
pub async fn seed_product<U: UnitOfWork>(uow: &U, price: Decimal, stock: u32) -> Result<Product> {
    let product = Product::new(NewProduct {
        name: "Test product".to_string(),
        description: String::new(),
        price: Price::new(price)?,
        stock,
    });

    let product = uow
        .execute(move |tx| async move { tx.products().create(&product).await }.boxed())
        .await?;
    Ok(product)
}

/// Read a product's committed stock through a fresh unit of work.
///
/// Returns `None` if the product does not exist or was deleted.
pub async fn product_stock<U: UnitOfWork>(uow: &U, id: ProductId) -> Result<Option<u32>> {
    let stock = uow
        .execute(move |tx| {
            async move {
                let product = tx.products().find_by_id(id).await?;
                Ok::<_, StoreError>(product.map(|p| p.stock))
            }
            .boxed()
        })
        .await?;
    Ok(stock)
}

/// Count committed, live orders through a fresh unit of work.
pub async fn order_count<U: UnitOfWork>(uow: &U) -> Result<usize> {
    let count = uow
        .execute(|tx| {
            async move {
                let orders = tx.orders().list().await?;
                Ok::<_, StoreError>(orders.len())
            }
            .boxed()
        })
        .await?;
    Ok(count)
}
