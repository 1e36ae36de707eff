//! Order placement workflow.
//!
//! # Flow
//!
//! ```text
//! create_order(request)
//!   └─ UnitOfWork::execute
//!        1. users().find_by_id(customer)          → InvalidCustomer
//!        2. products().find_by_id_for_update(id)  → InvalidProduct
//!        3. stock >= quantity                     → InsufficientStock
//!        4. products().update(decremented)        → StockUpdateFailed
//!        5. orders().create(order)                → Persistence
//!   └─ commit (or rollback on any error)
//! ```
//!
//! The stock check and the decrement happen inside the same transaction,
//! after the product row is locked, so two concurrent orders against the
//! same product can never both see the pre-decrement stock.

use crate::error::{OrderError, OrderResult};
use futures_util::FutureExt;
use shop_domain::{NewOrder, Order, OrderId};
use shop_store::{StoreTx, UnitOfWork};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Places, reads and deletes orders.
pub struct OrderService<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Clone for OrderService<U> {
    fn clone(&self) -> Self {
        Self { uow: self.uow.clone() }
    }
}

impl<U: UnitOfWork> OrderService<U> {
    /// Create a new order service over `uow`.
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Place an order: validate references, reserve stock and record the
    /// order as one atomic unit.
    ///
    /// # Errors
    ///
    /// - `InvalidCustomer` / `InvalidProduct`: reference does not resolve
    /// - `InsufficientStock`: fewer units in stock than requested
    /// - `StockUpdateFailed` / `Persistence`: a write failed
    /// - `TransactionFailed`: begin/commit failed or the engine aborted
    ///
    /// On any error nothing is written.
    pub async fn create_order(&self, request: NewOrder) -> OrderResult<Order> {
        info!(
            customer_id = %request.customer_id,
            product_id = %request.product_id,
            quantity = request.quantity.get(),
            "Placing order"
        );

        let result = self
            .uow
            .execute(move |tx| async move { place_order(tx, request).await }.boxed())
            .await;

        match &result {
            Ok(order) => info!(
                order_id = %order.id,
                total_price = %order.total_price,
                "Order placed"
            ),
            Err(err) if err.is_client_error() => warn!(error = %err, "Order rejected"),
            Err(err) => error!(
                error = %err,
                cause = ?std::error::Error::source(err).map(ToString::to_string),
                "Order failed"
            ),
        }

        result
    }

    /// Get an order by ID.
    pub async fn get_order(&self, id: OrderId) -> OrderResult<Order> {
        self.uow
            .execute(move |tx| {
                async move { tx.orders().find_by_id(id).await?.ok_or(OrderError::NotFound(id)) }
                    .boxed()
            })
            .await
    }

    /// List all live orders, oldest first.
    pub async fn list_orders(&self) -> OrderResult<Vec<Order>> {
        self.uow
            .execute(|tx| {
                async move { tx.orders().list().await.map_err(OrderError::from) }.boxed()
            })
            .await
    }

    /// Delete an order.
    ///
    /// Stock reserved by the order is not returned to the product.
    pub async fn delete_order(&self, id: OrderId) -> OrderResult<()> {
        self.uow
            .execute(move |tx| {
                async move {
                    tx.orders()
                        .delete(id)
                        .await
                        .map_err(|e| OrderError::or_not_found(e, OrderError::NotFound(id)))
                }
                .boxed()
            })
            .await?;

        info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

/// Steps 1-5 of order placement, run on an open transaction.
async fn place_order(tx: &mut dyn StoreTx, request: NewOrder) -> OrderResult<Order> {
    let NewOrder { customer_id, product_id, quantity } = request;

    // 1. Customer must exist (the nil id never does); share-lock it so it
    //    cannot be deleted before this order commits
    if customer_id.is_nil() || tx.users().find_by_id_for_share(customer_id).await?.is_none() {
        return Err(OrderError::InvalidCustomer(customer_id));
    }

    // 2. Product must exist; lock its row until the transaction ends
    let mut product = tx
        .products()
        .find_by_id_for_update(product_id)
        .await?
        .ok_or(OrderError::InvalidProduct(product_id))?;

    // 3 + 4. Check and decrement under the lock
    product.reserve(quantity)?;
    debug!(product_id = %product_id, remaining = product.stock, "Stock reserved");

    // Priced before any write so an out-of-range total touches nothing
    let order = Order::place(request, &product)?;

    tx.products().update(&product).await.map_err(OrderError::stock_update)?;

    // 5. Record the order, priced at the product's current price
    let order = tx.orders().create(&order).await?;
    Ok(order)
}

// =============================================================================
// Tests
// =============================================================================
