//! Shop Storage Layer
//!
//! Provides persistence for users, products and orders.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **Unit of work**: Groups repository calls into one atomic transaction
//! - **In-memory store**: Fast implementation for testing and local runs
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! # Usage
//!
//! ```rust
//! use futures_util::FutureExt;
//! use rust_decimal_macros::dec;
//! use shop_domain::{NewProduct, Price, Product};
//! use shop_store::{MemoryStore, StoreError, UnitOfWork};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let product = Product::new(NewProduct {
//!         name: "Widget".to_string(),
//!         description: String::new(),
//!         price: Price::new(dec!(9.99)).unwrap(),
//!         stock: 3,
//!     });
//!
//!     // Everything inside the closure commits or rolls back together
//!     let saved = store
//!         .execute(move |tx| {
//!             async move { tx.products().create(&product).await }.boxed()
//!         })
//!         .await
//!         .unwrap();
//!
//!     let listed: Result<_, StoreError> =
//!         store.execute(|tx| async move { tx.products().list().await }.boxed()).await;
//!     assert_eq!(listed.unwrap(), vec![saved]);
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::{FailPoint, MemoryStore, MemoryTransaction};
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgTransaction};
pub use repository::{OrderRepository, ProductRepository, StoreTx, UnitOfWork, UserRepository};
