//! In-memory store implementation
//!
//! Used for testing and development without a database.
//!
//! A transaction holds the store-wide lock from `begin` until it is committed
//! or dropped, so transactions are fully serialized. Writes go to a staged
//! copy of the tables and replace the live tables only on commit; dropping
//! the transaction (rollback, error, panic) discards them.

use crate::error::StoreError;
use crate::repository::{
    OrderRepository, ProductRepository, StoreTx, UnitOfWork, UserRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use shop_domain::{Order, OrderId, Product, ProductId, User, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Next `ProductRepository::update`
    ProductUpdate,
    /// Next `OrderRepository::create`
    OrderCreate,
    /// Next commit
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// Shared slot for a single pending failure
type FaultSlot = Arc<Mutex<Option<FailPoint>>>;

fn take_fault(slot: &FaultSlot, point: FailPoint) -> bool {
    let mut pending = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if *pending == Some(point) {
        *pending = None; // Reset after trigger
        true
    } else {
        false
    }
}

/// In-memory store for testing
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<AsyncMutex<Tables>>,
    fault: FaultSlot,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            tables: Arc::new(AsyncMutex::new(Tables::default())),
            fault: Arc::new(Mutex::new(None)),
        }
    }

    /// Configure the next operation at `point` to fail.
    pub fn set_fail_next(&self, point: FailPoint) {
        let mut pending = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = Some(point);
    }

    /// Get the number of live products
    pub async fn product_count(&self) -> usize {
        self.tables.lock().await.products.values().filter(|p| !p.is_deleted()).count()
    }

    /// Get the number of live orders
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.values().filter(|o| !o.is_deleted()).count()
    }

    /// Get the committed stock of a product (including soft-deleted ones)
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.tables.lock().await.products.get(&id).map(|p| p.stock)
    }

    /// Clear all data (useful for test setup)
    pub async fn clear(&self) {
        let mut tables = self.tables.lock().await;
        *tables = Tables::default();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Open transaction on a [`MemoryStore`]
pub struct MemoryTransaction {
    live: OwnedMutexGuard<Tables>,
    staged: Tables,
    fault: FaultSlot,
}

fn live_sorted<T: Clone>(
    rows: &HashMap<uuid::Uuid, T>,
    is_live: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, uuid::Uuid),
) -> Vec<T> {
    let mut out: Vec<T> = rows.values().filter(|r| is_live(r)).cloned().collect();
    out.sort_by_key(|r| key(r));
    out
}

// =============================================================================
// User Repository Implementation
// =============================================================================

#[async_trait]
impl UserRepository for MemoryTransaction {
    async fn create(&mut self, user: &User) -> Result<User, StoreError> {
        if self.staged.users.contains_key(&user.id) {
            return Err(StoreError::duplicate("user", user.id.to_string()));
        }
        self.staged.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    /// The transaction already owns the store-wide lock.
    async fn find_by_id_for_share(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        UserRepository::find_by_id(self, id).await
    }

    async fn list(&mut self) -> Result<Vec<User>, StoreError> {
        Ok(live_sorted(&self.staged.users, |u| !u.is_deleted(), |u| (u.created_at, u.id)))
    }

    async fn update(&mut self, user: &User) -> Result<User, StoreError> {
        match self.staged.users.get_mut(&user.id) {
            Some(existing) if !existing.is_deleted() => {
                *existing = User {
                    created_at: existing.created_at,
                    updated_at: Utc::now(),
                    deleted_at: None,
                    ..user.clone()
                };
                Ok(existing.clone())
            },
            _ => Err(StoreError::not_found("user", user.id.to_string())),
        }
    }

    async fn delete(&mut self, id: UserId) -> Result<(), StoreError> {
        match self.staged.users.get_mut(&id) {
            Some(existing) if !existing.is_deleted() => {
                let now = Utc::now();
                existing.deleted_at = Some(now);
                existing.updated_at = now;
                Ok(())
            },
            _ => Err(StoreError::not_found("user", id.to_string())),
        }
    }
}

// =============================================================================
// Product Repository Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryTransaction {
    async fn create(&mut self, product: &Product) -> Result<Product, StoreError> {
        if self.staged.products.contains_key(&product.id) {
            return Err(StoreError::duplicate("product", product.id.to_string()));
        }
        self.staged.products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.staged.products.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    /// The transaction already owns the store-wide lock.
    async fn find_by_id_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        ProductRepository::find_by_id(self, id).await
    }

    async fn list(&mut self) -> Result<Vec<Product>, StoreError> {
        Ok(live_sorted(&self.staged.products, |p| !p.is_deleted(), |p| (p.created_at, p.id)))
    }

    async fn update(&mut self, product: &Product) -> Result<Product, StoreError> {
        if take_fault(&self.fault, FailPoint::ProductUpdate) {
            return Err(StoreError::Database("Simulated product update failure".to_string()));
        }
        match self.staged.products.get_mut(&product.id) {
            Some(existing) if !existing.is_deleted() => {
                *existing = Product {
                    created_at: existing.created_at,
                    updated_at: Utc::now(),
                    deleted_at: None,
                    ..product.clone()
                };
                Ok(existing.clone())
            },
            _ => Err(StoreError::not_found("product", product.id.to_string())),
        }
    }

    async fn delete(&mut self, id: ProductId) -> Result<(), StoreError> {
        match self.staged.products.get_mut(&id) {
            Some(existing) if !existing.is_deleted() => {
                let now = Utc::now();
                existing.deleted_at = Some(now);
                existing.updated_at = now;
                Ok(())
            },
            _ => Err(StoreError::not_found("product", id.to_string())),
        }
    }
}

// =============================================================================
// Order Repository Implementation
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryTransaction {
    async fn create(&mut self, order: &Order) -> Result<Order, StoreError> {
        if take_fault(&self.fault, FailPoint::OrderCreate) {
            return Err(StoreError::Database("Simulated order insert failure".to_string()));
        }
        if self.staged.orders.contains_key(&order.id) {
            return Err(StoreError::duplicate("order", order.id.to_string()));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn find_by_id(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.staged.orders.get(&id).filter(|o| !o.is_deleted()).cloned())
    }

    async fn list(&mut self) -> Result<Vec<Order>, StoreError> {
        Ok(live_sorted(&self.staged.orders, |o| !o.is_deleted(), |o| (o.created_at, o.id)))
    }

    async fn delete(&mut self, id: OrderId) -> Result<(), StoreError> {
        match self.staged.orders.get_mut(&id) {
            Some(existing) if !existing.is_deleted() => {
                let now = Utc::now();
                existing.deleted_at = Some(now);
                existing.updated_at = now;
                Ok(())
            },
            _ => Err(StoreError::not_found("order", id.to_string())),
        }
    }
}

// =============================================================================
// Unit of Work Implementation
// =============================================================================

impl StoreTx for MemoryTransaction {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn products(&mut self) -> &mut dyn ProductRepository {
        self
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        self
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        let live = self.tables.clone().lock_owned().await;
        let staged = (*live).clone();
        Ok(MemoryTransaction {
            live,
            staged,
            fault: self.fault.clone(),
        })
    }

    async fn commit(&self, tx: MemoryTransaction) -> Result<(), StoreError> {
        let MemoryTransaction { mut live, staged, fault } = tx;
        if take_fault(&fault, FailPoint::Commit) {
            warn!("Simulated commit failure, discarding staged writes");
            return Err(StoreError::Transaction("Simulated commit failure".to_string()));
        }
        *live = staged;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTransaction) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
