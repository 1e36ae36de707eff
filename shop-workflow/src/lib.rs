//! Shop Workflows
//!
//! Use cases on top of the storage layer. Every operation runs inside one
//! [`shop_store::UnitOfWork::execute`] call.
//!
//! - [`OrderService`]: atomic order placement (the stock invariant lives here)
//! - [`ProductService`], [`UserService`]: catalog and customer maintenance

#![warn(clippy::all)]

mod error;
mod orders;
mod products;
mod users;

pub use error::{OrderError, OrderResult};
pub use orders::OrderService;
pub use products::ProductService;
pub use users::UserService;
