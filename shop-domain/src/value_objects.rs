//! Value Objects for the Shop Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time, including
//! when they are deserialized from a request body.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must not be negative
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be at least one unit
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Price times quantity does not fit a stored amount
    #[error("Invalid total: {0}")]
    InvalidTotal(String),

    /// Requested more units than the product has in stock
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested by the order
        requested: u32,
        /// Units currently in stock
        available: u32,
    },
}

// =============================================================================
// Price
// =============================================================================

/// Decimal places kept for stored amounts (`NUMERIC(20, 8)`).
pub const AMOUNT_SCALE: u32 = 8;

/// Exclusive upper bound for stored amounts: 12 integer digits.
const AMOUNT_LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn check_amount(value: Decimal) -> bool {
    value >= Decimal::ZERO && value < AMOUNT_LIMIT && value.scale() <= AMOUNT_SCALE
}

/// Unit price of a product
///
/// # Invariants
/// - Must be >= 0 (free items are allowed)
/// - At most 12 integer digits and [`AMOUNT_SCALE`] decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value < 0 or does not fit a
    /// stored amount
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must not be negative".to_string()));
        }
        let value = value.normalize();
        if !check_amount(value) {
            return Err(DomainError::InvalidPrice(format!(
                "Price must be below 10^12 with at most {} decimal places",
                AMOUNT_SCALE
            )));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Total cost of `quantity` units at this price
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTotal` if the total does not fit a stored
    /// amount
    pub fn total_for(&self, quantity: Quantity) -> Result<Decimal, DomainError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(|total| total.normalize())
            .filter(|total| check_amount(*total))
            .ok_or_else(|| {
                DomainError::InvalidTotal(format!("{} x {} is out of range", quantity, self.0))
            })
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Number of units requested by an order
///
/// # Invariants
/// - Must be >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value == 0
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::InvalidQuantity(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Get the underlying unit count
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Price tests
    #[test]
    fn test_price_validation() {
        assert!(Price::new(dec!(19.99)).is_ok());
        assert!(Price::new(dec!(0)).is_ok());
        assert!(Price::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_price_total_for_quantity() {
        let price = Price::new(dec!(2.50)).unwrap();
        let quantity = Quantity::new(3).unwrap();
        assert_eq!(price.total_for(quantity).unwrap(), dec!(7.50));
    }

    #[test]
    fn test_price_bounded_to_stored_precision() {
        assert!(Price::new(dec!(999999999999.99999999)).is_ok());
        assert!(Price::new(dec!(1000000000000)).is_err());
        assert!(Price::new(dec!(0.000000001)).is_err());
        assert!(Price::new(Decimal::MAX).is_err());

        // Trailing zeros do not count against the scale
        let price = Price::new(dec!(2.5000000000)).unwrap();
        assert_eq!(price.as_decimal(), dec!(2.5));
    }

    #[test]
    fn test_total_out_of_range_is_error() {
        let price = Price::new(dec!(999999999999)).unwrap();

        let err = price.total_for(Quantity::new(2).unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTotal(_)));

        let total = price.total_for(Quantity::new(1).unwrap()).unwrap();
        assert_eq!(total, dec!(999999999999));

        let half = Price::new(dec!(0.5)).unwrap();
        let total = half.total_for(Quantity::new(u32::MAX).unwrap()).unwrap();
        assert_eq!(total, dec!(2147483647.5));
    }

    #[test]
    fn test_price_rejects_negative_json() {
        let parsed: Result<Price, _> = serde_json::from_str("\"-1.00\"");
        assert!(parsed.is_err());

        let parsed: Price = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(parsed.as_decimal(), dec!(12.30));
    }

    // Quantity tests
    #[test]
    fn test_quantity_validation() {
        assert!(Quantity::new(1).is_ok());
        assert!(Quantity::new(500).is_ok());
        assert_eq!(
            Quantity::new(0),
            Err(DomainError::InvalidQuantity("Quantity must be at least 1".to_string()))
        );
    }

    #[test]
    fn test_quantity_rejects_zero_json() {
        let parsed: Result<Quantity, _> = serde_json::from_str("0");
        assert!(parsed.is_err());

        let parsed: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(parsed.get(), 4);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "4");
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = DomainError::InsufficientStock { requested: 3, available: 2 };
        assert_eq!(err.to_string(), "Insufficient stock: requested 3, available 2");
    }
}
