//! Workflow error types.
//!
//! Each variant has a fixed, human-readable message. Store and engine
//! details are kept in the `source()` chain for logging and never appear in
//! `Display`, so callers can map kinds to status codes without parsing text.

use shop_domain::{DomainError, OrderId, ProductId, UserId};
use shop_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the order, product and user workflows.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Customer reference does not resolve to a live user
    #[error("Invalid customer: {0}")]
    InvalidCustomer(UserId),

    /// Product reference does not resolve to a live product
    #[error("Invalid product: {0}")]
    InvalidProduct(ProductId),

    /// Requested quantity exceeds current stock
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested
        requested: u32,
        /// Units in stock when the order was checked
        available: u32,
    },

    /// Malformed payload (empty name, negative price, zero quantity, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Writing the decremented stock failed
    #[error("Failed to update product stock")]
    StockUpdateFailed(#[source] StoreError),

    /// Transaction could not begin or commit, or the engine aborted it
    /// (deadlock, lock timeout)
    #[error("Transaction failed")]
    TransactionFailed(#[source] StoreError),

    /// Any other storage failure
    #[error("Persistence failure")]
    Persistence(#[source] StoreError),

    /// Order does not exist (or was deleted)
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Product does not exist (or was deleted)
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// User does not exist (or was deleted)
    #[error("User not found: {0}")]
    UserNotFound(UserId),
}

impl OrderError {
    /// Caller sent something that can never succeed as-is (4xx class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCustomer(_)
                | Self::InvalidProduct(_)
                | Self::InsufficientStock { .. }
                | Self::InvalidInput(_)
        )
    }

    /// Referenced entity is absent (404 class).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ProductNotFound(_) | Self::UserNotFound(_))
    }

    /// Classify a failed stock write. Engine aborts stay transaction failures.
    pub(crate) fn stock_update(err: StoreError) -> Self {
        match err {
            StoreError::Transaction(_) => Self::TransactionFailed(err),
            other => Self::StockUpdateFailed(other),
        }
    }

    /// Translate a store not-found into `not_found`, everything else as usual.
    pub(crate) fn or_not_found(err: StoreError, not_found: Self) -> Self {
        if err.is_not_found() {
            not_found
        } else {
            err.into()
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transaction(_) | StoreError::NestedTransaction => {
                Self::TransactionFailed(err)
            },
            other => Self::Persistence(other),
        }
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock { requested, available } => {
                Self::InsufficientStock { requested, available }
            },
            DomainError::InvalidPrice(msg)
            | DomainError::InvalidQuantity(msg)
            | DomainError::InvalidTotal(msg) => Self::InvalidInput(msg),
        }
    }
}

/// Result type for workflow operations.
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use uuid::Uuid;

    #[test]
    fn test_display_hides_engine_text() {
        let err = OrderError::from(StoreError::Database("relation \"orders\" is locked".into()));

        assert_eq!(err.to_string(), "Persistence failure");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_transaction_errors_classified() {
        let err = OrderError::from(StoreError::Transaction("deadlock detected".into()));
        assert!(matches!(err, OrderError::TransactionFailed(_)));

        let err = OrderError::from(StoreError::NestedTransaction);
        assert!(matches!(err, OrderError::TransactionFailed(_)));

        let err = OrderError::stock_update(StoreError::Transaction("lock timeout".into()));
        assert!(matches!(err, OrderError::TransactionFailed(_)));

        let err = OrderError::stock_update(StoreError::Database("disk full".into()));
        assert!(matches!(err, OrderError::StockUpdateFailed(_)));
    }

    #[test]
    fn test_error_classes() {
        let id = Uuid::now_v7();

        assert!(OrderError::InvalidCustomer(id).is_client_error());
        assert!(OrderError::InsufficientStock { requested: 2, available: 1 }.is_client_error());
        assert!(!OrderError::TransactionFailed(StoreError::NestedTransaction).is_client_error());

        assert!(OrderError::NotFound(id).is_not_found());
        assert!(OrderError::UserNotFound(id).is_not_found());
        assert!(!OrderError::InvalidProduct(id).is_not_found());
    }

    #[test]
    fn test_domain_error_mapping() {
        let err = OrderError::from(DomainError::InsufficientStock { requested: 3, available: 2 });
        assert_eq!(err.to_string(), "Insufficient stock: requested 3, available 2");

        let err = OrderError::from(DomainError::InvalidQuantity("Quantity must be at least 1".into()));
        assert!(matches!(err, OrderError::InvalidInput(_)));

        let err = OrderError::from(DomainError::InvalidTotal("out of range".into()));
        assert!(err.is_client_error());
    }
}
