//! Product catalog workflow.
//!
//! Thin pass-through over the product repository. Each call is its own
//! unit of work.

use crate::error::{OrderError, OrderResult};
use futures_util::FutureExt;
use shop_domain::{NewProduct, Product, ProductId, ProductUpdate};
use shop_store::UnitOfWork;
use std::sync::Arc;
use tracing::info;

/// Creates, reads, updates and deletes products.
pub struct ProductService<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Clone for ProductService<U> {
    fn clone(&self) -> Self {
        Self { uow: self.uow.clone() }
    }
}

fn validate_name(name: &str) -> OrderResult<()> {
    if name.trim().is_empty() {
        return Err(OrderError::InvalidInput("Product name must not be empty".to_string()));
    }
    Ok(())
}

impl<U: UnitOfWork> ProductService<U> {
    /// Create a new product service over `uow`.
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Add a product to the catalog.
    pub async fn create(&self, params: NewProduct) -> OrderResult<Product> {
        validate_name(&params.name)?;
        let product = Product::new(params);

        let product = self
            .uow
            .execute(move |tx| {
                async move { tx.products().create(&product).await.map_err(OrderError::from) }
                    .boxed()
            })
            .await?;

        info!(product_id = %product.id, stock = product.stock, "Product created");
        Ok(product)
    }

    /// Get a product by ID.
    pub async fn get(&self, id: ProductId) -> OrderResult<Product> {
        self.uow
            .execute(move |tx| {
                async move {
                    tx.products().find_by_id(id).await?.ok_or(OrderError::ProductNotFound(id))
                }
                .boxed()
            })
            .await
    }

    /// List live products, oldest first.
    pub async fn list(&self) -> OrderResult<Vec<Product>> {
        self.uow
            .execute(|tx| {
                async move { tx.products().list().await.map_err(OrderError::from) }.boxed()
            })
            .await
    }

    /// Apply a partial update to a product.
    pub async fn update(&self, id: ProductId, update: ProductUpdate) -> OrderResult<Product> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }

        let product = self
            .uow
            .execute(move |tx| {
                async move {
                    let mut product = tx
                        .products()
                        .find_by_id_for_update(id)
                        .await?
                        .ok_or(OrderError::ProductNotFound(id))?;
                    product.apply(update);
                    tx.products()
                        .update(&product)
                        .await
                        .map_err(|e| OrderError::or_not_found(e, OrderError::ProductNotFound(id)))
                }
                .boxed()
            })
            .await?;

        info!(product_id = %id, stock = product.stock, "Product updated");
        Ok(product)
    }

    /// Soft-delete a product.
    pub async fn delete(&self, id: ProductId) -> OrderResult<()> {
        self.uow
            .execute(move |tx| {
                async move {
                    tx.products()
                        .delete(id)
                        .await
                        .map_err(|e| OrderError::or_not_found(e, OrderError::ProductNotFound(id)))
                }
                .boxed()
            })
            .await?;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
