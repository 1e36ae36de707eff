//! Test helpers for shop store-backed tests.
//!
//! Seeding and inspection helpers that work against any [`shop_store::UnitOfWork`],
//! so the same fixtures serve the in-memory store and PostgreSQL.

mod helpers;

pub use helpers::{order_count, product_stock, seed_product, seed_user};

/// Result type for test helpers.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Setup a clean test database by running migrations.
///
/// Convenience function for tests that need a fresh schema.
#[cfg(feature = "postgres")]
pub async fn setup_test_db(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    Ok(())
}
