//! Shop Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains the customer, product and order entities plus validated value objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    NewOrder, NewProduct, NewUser, Order, OrderId, Product, ProductId, ProductUpdate, User,
    UserId, UserUpdate,
};
pub use value_objects::{DomainError, Price, Quantity};
