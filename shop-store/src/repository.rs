//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the domain.
//! Repositories are only reachable through a [`StoreTx`], and a `StoreTx`
//! only exists inside [`UnitOfWork::execute`], so every read and write the
//! workflows perform is bound to one transaction.

use crate::error::StoreError;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use shop_domain::{Order, OrderId, Product, ProductId, User, UserId};
use tracing::{debug, warn};

tokio::task_local! {
    /// Set while a unit of work is running on the current task.
    static IN_UNIT_OF_WORK: ();
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send {
    /// Insert a new user
    async fn create(&mut self, user: &User) -> Result<User, StoreError>;

    /// Find a live (not soft-deleted) user by ID
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Find a live user by ID and hold a shared lock on it until the
    /// transaction ends, so it cannot be deleted or updated meanwhile
    async fn find_by_id_for_share(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// List live users, oldest first
    async fn list(&mut self) -> Result<Vec<User>, StoreError>;

    /// Overwrite a live user's fields
    async fn update(&mut self, user: &User) -> Result<User, StoreError>;

    /// Soft-delete a user
    async fn delete(&mut self, id: UserId) -> Result<(), StoreError>;
}

/// Repository for Product entities
#[async_trait]
pub trait ProductRepository: Send {
    /// Insert a new product
    async fn create(&mut self, product: &Product) -> Result<Product, StoreError>;

    /// Find a live product by ID
    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Find a live product by ID and hold a write lock on it until the
    /// transaction ends
    async fn find_by_id_for_update(&mut self, id: ProductId)
        -> Result<Option<Product>, StoreError>;

    /// List live products, oldest first
    async fn list(&mut self) -> Result<Vec<Product>, StoreError>;

    /// Overwrite a live product's fields (including stock)
    async fn update(&mut self, product: &Product) -> Result<Product, StoreError>;

    /// Soft-delete a product
    async fn delete(&mut self, id: ProductId) -> Result<(), StoreError>;
}

/// Repository for Order entities
///
/// Orders are never updated once placed.
#[async_trait]
pub trait OrderRepository: Send {
    /// Insert a new order
    async fn create(&mut self, order: &Order) -> Result<Order, StoreError>;

    /// Find a live order by ID
    async fn find_by_id(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// List live orders, oldest first
    async fn list(&mut self) -> Result<Vec<Order>, StoreError>;

    /// Soft-delete an order
    async fn delete(&mut self, id: OrderId) -> Result<(), StoreError>;
}

/// Transaction-scoped access to all repositories
pub trait StoreTx: Send {
    /// Get user repository
    fn users(&mut self) -> &mut dyn UserRepository;

    /// Get product repository
    fn products(&mut self) -> &mut dyn ProductRepository;

    /// Get order repository
    fn orders(&mut self) -> &mut dyn OrderRepository;
}

/// Atomic execution of a group of repository operations.
///
/// Adapters provide `begin`/`commit`/`rollback`; callers use [`execute`].
///
/// # Nesting
///
/// Calling `execute` from inside a running `execute` on the same task is
/// rejected with [`StoreError::NestedTransaction`] before any transaction is
/// opened. The outer unit of work is unaffected and decides on its own
/// whether to commit.
///
/// [`execute`]: UnitOfWork::execute
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Transaction handle produced by this adapter
    type Tx: StoreTx + 'static;

    /// Open a transaction
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Make every write done through `tx` visible
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Discard every write done through `tx`
    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Run `work` inside one transaction.
    ///
    /// - `Ok` from `work`: the transaction is committed and the value returned.
    ///   A failed commit is returned as `StoreError::Transaction`.
    /// - `Err` from `work`: the transaction is rolled back, then the error is
    ///   returned unchanged.
    /// - panic in `work`: the transaction handle is dropped while unwinding,
    ///   which discards its writes.
    ///
    /// The `StoreTx` handed to `work` cannot outlive the call.
    async fn execute<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> BoxFuture<'t, Result<T, E>> + Send + 'static,
    {
        if IN_UNIT_OF_WORK.try_with(|_| ()).is_ok() {
            warn!("Rejected nested unit of work");
            return Err(StoreError::NestedTransaction.into());
        }

        let mut tx = self.begin().await?;
        debug!("Transaction started");

        let outcome = {
            let handle: &mut dyn StoreTx = &mut tx;
            IN_UNIT_OF_WORK.scope((), work(handle)).await
        };

        match outcome {
            Ok(value) => {
                self.commit(tx).await?;
                debug!("Transaction committed");
                Ok(value)
            },
            Err(err) => {
                if let Err(rollback_err) = self.rollback(tx).await {
                    // The engine drops the transaction anyway once the
                    // connection is released.
                    warn!(error = %rollback_err, "Rollback failed");
                }
                debug!("Transaction rolled back");
                Err(err)
            },
        }
    }
}
