//! Storage layer error types
//!
//! All errors that can occur while driving the transactional store are defined
//! here. We use `thiserror` for ergonomic error definition.

use thiserror::Error;

use crate::storage::types::{SavepointId, TxId};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// a physical transaction with this id is already open
    #[error("transaction already active: {0}")]
    TransactionAlreadyActive(TxId),

    /// the physical transaction is unknown (never begun, or already finished)
    #[error("transaction not active: {0}")]
    TransactionNotActive(TxId),

    /// the store cannot create savepoints
    #[error("savepoints are not supported by this store")]
    SavepointsUnsupported,

    /// the savepoint was released or rolled back already
    #[error("savepoint not found: {savepoint} in transaction {tx}")]
    SavepointNotFound { tx: TxId, savepoint: SavepointId },
}

impl StorageError {
    /// check if this error refers to a transaction or savepoint that doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::TransactionNotActive(_) | StorageError::SavepointNotFound { .. }
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let tx = TxId::generate();
        assert!(StorageError::TransactionNotActive(tx).is_not_found());
        assert!(!StorageError::TransactionAlreadyActive(tx).is_not_found());
        assert!(!StorageError::SavepointsUnsupported.is_not_found());
    }
}
