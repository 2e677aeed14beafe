//! Service error types.

use thiserror::Error;

use crate::storage::StorageError;
use crate::transaction::{RollbackOn, TransactionError};

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the user services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Unchecked failure raised by service code. Rolls back.
    #[error("runtime failure: {0}")]
    Runtime(String),

    /// Business rule failure. Does not roll back.
    #[error("business rule violated: {0}")]
    Business(String),
}

impl ServiceError {
    /// The propagation-layer error behind this failure, if any.
    pub fn transaction_error(&self) -> Option<&TransactionError> {
        match self {
            ServiceError::Transaction(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_illegal_transaction_state(&self) -> bool {
        matches!(
            self.transaction_error(),
            Some(TransactionError::IllegalTransactionState { .. })
        )
    }

    pub fn is_nested_not_supported(&self) -> bool {
        matches!(
            self.transaction_error(),
            Some(TransactionError::NestedNotSupported { .. })
        )
    }
}

impl RollbackOn for ServiceError {
    fn requires_rollback(&self) -> bool {
        !matches!(self, ServiceError::Business(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_classification() {
        assert!(ServiceError::Runtime("boom".into()).requires_rollback());
        assert!(!ServiceError::Business("no".into()).requires_rollback());
    }

    #[test]
    fn test_kind_helpers() {
        let err = ServiceError::from(TransactionError::NestedNotSupported {
            name: "svc".into(),
            reason: "no savepoints",
        });
        assert!(err.is_nested_not_supported());
        assert!(!err.is_illegal_transaction_state());
        assert!(ServiceError::Runtime("boom".into()).transaction_error().is_none());
    }
}
