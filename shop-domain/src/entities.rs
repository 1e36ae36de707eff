//! Domain Entities for the Shop
//!
//! Customers, products and orders. Every entity carries a UUID v7 identifier
//! and audit timestamps; deletion is soft (`deleted_at` is set, the row stays).

use crate::value_objects::{DomainError, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a User (customer)
pub type UserId = Uuid;

/// Unique identifier for a Product
pub type ProductId = Uuid;

/// Unique identifier for an Order
pub type OrderId = Uuid;

// =============================================================================
// User
// =============================================================================

/// A registered customer.
///
/// Only existence matters to order placement; profile fields are carried
/// for the user endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// When the user was registered
    pub created_at: DateTime<Utc>,
    /// When the user was last modified
    pub updated_at: DateTime<Utc>,
    /// Set once the user is soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
}

/// Partial update for a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New login name
    pub username: Option<String>,
    /// New contact address
    pub email: Option<String>,
}

impl User {
    /// Create a new user with a fresh identifier
    pub fn new(params: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username: params.username,
            email: params.email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
    }

    /// Check if the user has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// # Invariants
/// - `stock` is never negative (enforced by the type and by [`Product::reserve`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Current unit price
    pub price: Price,
    /// Units available for ordering
    pub stock: u32,
    /// When the product was added
    pub created_at: DateTime<Utc>,
    /// When the product was last modified
    pub updated_at: DateTime<Utc>,
    /// Set once the product is soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for adding a product to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Free-form description (empty if omitted)
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: Price,
    /// Initial stock
    pub stock: u32,
}

/// Partial update for a product; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New unit price
    pub price: Option<Price>,
    /// New stock level
    pub stock: Option<u32>,
}

impl Product {
    /// Create a new product with a fresh identifier
    pub fn new(params: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: params.name,
            description: params.description,
            price: params.price,
            stock: params.stock,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: ProductUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
    }

    /// Take `quantity` units out of stock.
    ///
    /// # Errors
    /// Returns `DomainError::InsufficientStock` and leaves stock untouched
    /// if fewer than `quantity` units are available.
    pub fn reserve(&mut self, quantity: Quantity) -> Result<(), DomainError> {
        self.stock = self.stock.checked_sub(quantity.get()).ok_or(
            DomainError::InsufficientStock {
                requested: quantity.get(),
                available: self.stock,
            },
        )?;
        Ok(())
    }

    /// Check if the product has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// `total_price` is fixed when the order is placed (quantity × unit price at
/// that moment) and is never recomputed from later product prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier
    pub id: OrderId,
    /// Customer who placed the order
    pub customer_id: UserId,
    /// Product ordered
    pub product_id: ProductId,
    /// Units ordered
    pub quantity: Quantity,
    /// Unit price times quantity at placement
    pub total_price: Decimal,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// When the order was last modified
    pub updated_at: DateTime<Utc>,
    /// Set once the order is soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A prospective order as submitted by a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewOrder {
    /// Customer placing the order
    pub customer_id: UserId,
    /// Product to order
    pub product_id: ProductId,
    /// Units to order
    pub quantity: Quantity,
}

impl Order {
    /// Place an order for `product`, pricing it at the product's current price
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTotal` if the total is out of range
    pub fn place(request: NewOrder, product: &Product) -> Result<Self, DomainError> {
        let total_price = product.price.total_for(request.quantity)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            customer_id: request.customer_id,
            product_id: product.id,
            quantity: request.quantity,
            total_price,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Check if the order has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
