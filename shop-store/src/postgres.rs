//! PostgreSQL store implementation (feature `postgres`).
//!
//! Every unit of work runs in one `READ COMMITTED` transaction. The product
//! row read by [`ProductRepository::find_by_id_for_update`] is locked with
//! `SELECT ... FOR UPDATE`, so concurrent orders against the same product
//! queue behind each other until the first transaction commits or rolls back.
//! The customer row is read with `SELECT ... FOR SHARE`
//! ([`UserRepository::find_by_id_for_share`]), which blocks a concurrent
//! soft delete of that customer until the order is committed.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{
    OrderRepository, ProductRepository, StoreTx, UnitOfWork, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shop_domain::{Order, OrderId, Price, Product, ProductId, Quantity, User, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, created_at, updated_at, deleted_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, created_at, updated_at, deleted_at";
const ORDER_COLUMNS: &str =
    "id, customer_id, product_id, quantity, total_price, created_at, updated_at, deleted_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    /// PostgreSQL connection pool
    pool: PgPool,
}

impl PgStore {
    /// Create a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Open transaction on a [`PgStore`]
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

// =============================================================================
// Row mapping
// =============================================================================

fn stock_from_db(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Deserialization(format!("{} out of range: {}", column, value)))
}

fn parse_user_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at")?,
    })
}

fn parse_product_row(row: &PgRow) -> Result<Product, StoreError> {
    let price: Decimal = row.try_get("price")?;
    let stock: i64 = row.try_get("stock")?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Price::new(price)?,
        stock: stock_from_db("stock", stock)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at")?,
    })
}

fn parse_order_row(row: &PgRow) -> Result<Order, StoreError> {
    let quantity: i64 = row.try_get("quantity")?;

    Ok(Order {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        product_id: row.try_get("product_id")?,
        quantity: Quantity::new(stock_from_db("quantity", quantity)?)?,
        total_price: row.try_get::<Decimal, _>("total_price")?.normalize(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at")?,
    })
}

impl PgTransaction {
    /// Soft-delete a live row in `table`.
    async fn soft_delete(&mut self, table: &str, entity: &str, id: Uuid) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
            table
        );
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity, id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// User Repository Implementation
// =============================================================================

#[async_trait]
impl UserRepository for PgTransaction {
    async fn create(&mut self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&mut *self.tx)
            .await?;
        parse_user_row(&row)
    }

    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(parse_user_row).transpose()
    }

    async fn find_by_id_for_share(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL FOR SHARE",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(parse_user_row).transpose()
    }

    async fn list(&mut self) -> Result<Vec<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC",
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(parse_user_row).collect()
    }

    async fn update(&mut self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET username = $2, email = $3, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => parse_user_row(&row),
            None => Err(StoreError::not_found("user", user.id.to_string())),
        }
    }

    async fn delete(&mut self, id: UserId) -> Result<(), StoreError> {
        self.soft_delete("users", "user", id).await
    }
}

// =============================================================================
// Product Repository Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for PgTransaction {
    async fn create(&mut self, product: &Product) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products (id, name, description, price, stock, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.as_decimal())
            .bind(i64::from(product.stock))
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&mut *self.tx)
            .await?;
        parse_product_row(&row)
    }

    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = $1 AND deleted_at IS NULL",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(parse_product_row).transpose()
    }

    async fn find_by_id_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(parse_product_row).transpose()
    }

    async fn list(&mut self) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(parse_product_row).collect()
    }

    async fn update(&mut self, product: &Product) -> Result<Product, StoreError> {
        let sql = format!(
            "UPDATE products SET name = $2, description = $3, price = $4, stock = $5, \
             updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.as_decimal())
            .bind(i64::from(product.stock))
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => parse_product_row(&row),
            None => Err(StoreError::not_found("product", product.id.to_string())),
        }
    }

    async fn delete(&mut self, id: ProductId) -> Result<(), StoreError> {
        self.soft_delete("products", "product", id).await
    }
}

// =============================================================================
// Order Repository Implementation
// =============================================================================

#[async_trait]
impl OrderRepository for PgTransaction {
    async fn create(&mut self, order: &Order) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (id, customer_id, product_id, quantity, total_price, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(order.id)
            .bind(order.customer_id)
            .bind(order.product_id)
            .bind(i64::from(order.quantity.get()))
            .bind(order.total_price)
            .bind(order.created_at)
            .bind(order.updated_at)
            .fetch_one(&mut *self.tx)
            .await?;
        parse_order_row(&row)
    }

    async fn find_by_id(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE id = $1 AND deleted_at IS NULL",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(parse_order_row).transpose()
    }

    async fn list(&mut self) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(parse_order_row).collect()
    }

    async fn delete(&mut self, id: OrderId) -> Result<(), StoreError> {
        self.soft_delete("orders", "order", id).await
    }
}

// =============================================================================
// Unit of Work Implementation
// =============================================================================

impl StoreTx for PgTransaction {
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
impl UnitOfWork for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to begin: {}", e)))?;
        Ok(PgTransaction { tx })
    }

    async fn commit(&self, tx: PgTransaction) -> Result<(), StoreError> {
        tx.tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to commit: {}", e)))
    }

    async fn rollback(&self, tx: PgTransaction) -> Result<(), StoreError> {
        tx.tx
            .rollback()
            .await
            .map_err(|e| StoreError::Transaction(format!("Failed to roll back: {}", e)))
    }
}
