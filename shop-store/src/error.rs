//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found (or soft-deleted)
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (user, product, order)
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Duplicate entity
    #[error("Duplicate entity: {entity_type} with id {id}")]
    Duplicate {
        /// Type of entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Transaction could not begin, commit or roll back (includes deadlocks
    /// and lock timeouts reported by the engine)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// `execute` was called from inside another `execute` on the same task
    #[error("Nested unit of work is not supported")]
    NestedTransaction,

    /// Deserialization error (reading a row back into a domain type)
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] shop_domain::DomainError),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a duplicate error
    pub fn duplicate(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity_type: "unknown".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::Duplicate {
                    entity_type: "unknown".to_string(),
                    id: "unknown".to_string(),
                },
                // serialization_failure, deadlock_detected, lock_not_available
                Some("40001") | Some("40P01") | Some("55P03") => {
                    StoreError::Transaction(db_err.to_string())
                },
                _ => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut => StoreError::Transaction(err.to_string()),
            _ => StoreError::Database(err.to_string()),
        }
    }
}
