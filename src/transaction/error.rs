//! Transaction error types.

use thiserror::Error;

use crate::storage::StorageError;
use crate::transaction::propagation::PropagationMode;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors raised by the transaction layer itself.
///
/// Errors produced by the work running inside a transaction are never
/// wrapped in this type; they come back to the caller unchanged.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The propagation contract does not allow the current state
    /// (MANDATORY without a transaction, NEVER inside one).
    #[error("illegal transaction state for '{name}' ({mode}): {reason}")]
    IllegalTransactionState {
        name: String,
        mode: PropagationMode,
        reason: &'static str,
    },

    /// NESTED inside a transaction whose resource cannot create savepoints.
    #[error("nested transaction not supported for '{name}': {reason}")]
    NestedNotSupported { name: String, reason: &'static str },

    /// The transaction was marked rollback-only by a participant, so the
    /// commit requested by its owner turned into a rollback.
    #[error("transaction '{name}' rolled back because it has been marked as rollback-only")]
    UnexpectedRollback { name: String },

    /// `leave` without a matching `enter`.
    #[error("no transaction scope in progress")]
    NoScope,

    /// Invalid transaction manager configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal error.
    #[error("internal transaction error: {0}")]
    Internal(String),
}

impl TransactionError {
    /// Check if this error is a propagation-contract violation, raised before
    /// any work ran.
    pub fn is_propagation_violation(&self) -> bool {
        matches!(
            self,
            TransactionError::IllegalTransactionState { .. }
                | TransactionError::NestedNotSupported { .. }
        )
    }

    pub(crate) fn illegal_state(
        name: impl Into<String>,
        mode: PropagationMode,
        reason: &'static str,
    ) -> Self {
        Self::IllegalTransactionState {
            name: name.into(),
            mode,
            reason,
        }
    }
}

/// Classifies errors coming out of transactional work.
///
/// Errors that require rollback roll back the transaction they escape from;
/// the others let it commit, the way checked business exceptions do.
pub trait RollbackOn {
    fn requires_rollback(&self) -> bool;
}

impl RollbackOn for TransactionError {
    fn requires_rollback(&self) -> bool {
        true
    }
}
