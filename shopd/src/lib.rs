//! Shop Daemon Library
//!
//! HTTP front end for the order placement workflow.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum) → OrderService / ProductService / UserService
//!                         ↓
//!                   UnitOfWork::execute
//!                         ↓
//!               MemoryStore | PgStore
//! ```
//!
//! # Components
//!
//! - **Daemon**: Opens the store, serves the API, shuts down gracefully
//! - **API**: HTTP endpoints for orders, products and users
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use shopd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_memory(config);
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
#[cfg(feature = "postgres")]
pub mod db;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, Environment, LogFormat, StoreBackend, StoreConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
