//! Transaction context of one call chain.
//!
//! The context is a stack of logical transactions, outermost first. Each
//! logical transaction either owns a physical transaction, participates in
//! the one it found, runs inside a savepoint of it, or runs without any.
//!
//! The context is passed explicitly down the call chain. It is never shared
//! between call chains, so it needs no locking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::storage::{SavepointId, TxId};
use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::propagation::PropagationMode;

/// How a logical transaction relates to the physical transaction it runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participation {
    /// Began the physical transaction and decides its outcome.
    Owner,
    /// Joined the physical transaction of an outer scope.
    Participant,
    /// Runs inside a savepoint of the outer physical transaction.
    Savepoint(SavepointId),
    /// Runs without a physical transaction.
    NonTransactional,
}

/// One transactional boundary on the stack.
#[derive(Debug, Clone)]
pub struct LogicalTransaction {
    /// Name visible to the work running inside (the current transaction name).
    pub(crate) name: String,
    /// Method that declared the boundary.
    pub(crate) method: String,
    pub(crate) mode: PropagationMode,
    pub(crate) physical: Option<TxId>,
    pub(crate) participation: Participation,
    /// Outer physical transaction hidden while this scope runs.
    pub(crate) suspended: Option<TxId>,
}

impl LogicalTransaction {
    pub(crate) fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        mode: PropagationMode,
        physical: Option<TxId>,
        participation: Participation,
    ) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            mode,
            physical,
            participation,
            suspended: None,
        }
    }

    pub(crate) fn suspending(mut self, outer: Option<TxId>) -> Self {
        self.suspended = outer;
        self
    }

    pub fn physical(&self) -> Option<TxId> {
        self.physical
    }

    /// Whether this scope owns its physical transaction.
    pub fn is_new_transaction(&self) -> bool {
        self.participation == Participation::Owner
    }
}

/// Bookkeeping for a physical transaction opened in this call chain.
#[derive(Debug, Clone)]
pub struct PhysicalTransaction {
    pub id: TxId,
    /// Name of the logical transaction that began it.
    pub name: String,
    pub rollback_only: bool,
    pub started_at: DateTime<Utc>,
}

/// What a boundary did when it was entered. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub method: String,
    /// Transaction name in effect inside the boundary.
    pub name: String,
    pub mode: PropagationMode,
    pub participation: Participation,
    pub physical: Option<TxId>,
    /// Outer physical transaction suspended by the boundary.
    pub suspended: Option<TxId>,
}

/// Transaction state of one call chain.
#[derive(Debug, Default)]
pub struct TransactionContext {
    scopes: Vec<LogicalTransaction>,
    physicals: HashMap<TxId, PhysicalTransaction>,
    history: Vec<TransactionRecord>,
    opened: usize,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a logical transaction. Owners register their physical transaction.
    pub fn enter(&mut self, scope: LogicalTransaction) {
        if let (Participation::Owner, Some(id)) = (scope.participation, scope.physical) {
            self.physicals.insert(
                id,
                PhysicalTransaction {
                    id,
                    name: scope.name.clone(),
                    rollback_only: false,
                    started_at: Utc::now(),
                },
            );
            self.opened += 1;
        }
        self.history.push(TransactionRecord {
            method: scope.method.clone(),
            name: scope.name.clone(),
            mode: scope.mode,
            participation: scope.participation,
            physical: scope.physical,
            suspended: scope.suspended,
        });
        self.scopes.push(scope);
    }

    /// Pop the innermost logical transaction.
    pub fn leave(&mut self) -> TransactionResult<LogicalTransaction> {
        self.scopes.pop().ok_or(TransactionError::NoScope)
    }

    /// Remove the bookkeeping of a finished physical transaction.
    pub(crate) fn finish_physical(&mut self, id: TxId) -> TransactionResult<PhysicalTransaction> {
        self.physicals
            .remove(&id)
            .ok_or_else(|| TransactionError::Internal(format!("unknown physical transaction {}", id)))
    }

    /// Whether the innermost scope runs in a physical transaction.
    pub fn is_physical_open(&self) -> bool {
        self.current_physical().is_some()
    }

    /// Physical transaction of the innermost scope.
    pub fn current_physical(&self) -> Option<TxId> {
        self.scopes.last().and_then(|scope| scope.physical)
    }

    /// Name of the innermost logical transaction, if any.
    pub fn current_transaction_name(&self) -> Option<&str> {
        self.scopes.last().map(|scope| scope.name.as_str())
    }

    /// Number of logical transactions on the stack.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Number of outer physical transactions currently suspended.
    pub fn suspended_count(&self) -> usize {
        self.scopes
            .iter()
            .filter(|scope| scope.suspended.is_some())
            .count()
    }

    /// Every boundary entered so far, in entry order.
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    /// Total physical transactions begun through this context.
    pub fn physical_transactions_opened(&self) -> usize {
        self.opened
    }

    /// Doom a physical transaction: its owner can only roll it back.
    pub fn mark_rollback_only(&mut self, id: TxId) {
        if let Some(physical) = self.physicals.get_mut(&id) {
            physical.rollback_only = true;
        }
    }

    /// Clear the rollback-only mark, e.g. after the failed work was undone by
    /// rolling back to a savepoint.
    pub fn reset_rollback_only(&mut self, id: TxId) {
        if let Some(physical) = self.physicals.get_mut(&id) {
            physical.rollback_only = false;
        }
    }

    pub fn is_rollback_only(&self, id: TxId) -> bool {
        self.physicals
            .get(&id)
            .map(|physical| physical.rollback_only)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(name: &str) -> LogicalTransaction {
        LogicalTransaction::new(
            name,
            name,
            PropagationMode::Required,
            Some(TxId::generate()),
            Participation::Owner,
        )
    }

    #[test]
    fn test_empty_context() {
        let mut ctx = TransactionContext::new();
        assert!(!ctx.is_physical_open());
        assert_eq!(ctx.current_transaction_name(), None);
        assert!(matches!(ctx.leave(), Err(TransactionError::NoScope)));
    }

    #[test]
    fn test_enter_and_leave() {
        let mut ctx = TransactionContext::new();
        let scope = owner("outer");
        let tx = scope.physical().unwrap();
        ctx.enter(scope);

        assert!(ctx.is_physical_open());
        assert_eq!(ctx.current_physical(), Some(tx));
        assert_eq!(ctx.current_transaction_name(), Some("outer"));
        assert_eq!(ctx.physical_transactions_opened(), 1);
        assert_eq!(ctx.history().len(), 1);
        assert_eq!(ctx.history()[0].participation, Participation::Owner);

        let left = ctx.leave().unwrap();
        assert!(left.is_new_transaction());
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.finish_physical(tx).is_ok());
    }

    #[test]
    fn test_suspension_hides_outer_physical() {
        let mut ctx = TransactionContext::new();
        let outer = owner("outer");
        let outer_tx = outer.physical();
        ctx.enter(outer);

        ctx.enter(
            LogicalTransaction::new(
                "inner",
                "inner",
                PropagationMode::NotSupported,
                None,
                Participation::NonTransactional,
            )
            .suspending(outer_tx),
        );
        assert!(!ctx.is_physical_open());
        assert_eq!(ctx.suspended_count(), 1);
        assert_eq!(ctx.current_transaction_name(), Some("inner"));
        assert_eq!(ctx.history()[1].suspended, outer_tx);

        ctx.leave().unwrap();
        assert!(ctx.is_physical_open());
        assert_eq!(ctx.suspended_count(), 0);
    }

    #[test]
    fn test_rollback_only_marking() {
        let mut ctx = TransactionContext::new();
        let scope = owner("outer");
        let tx = scope.physical().unwrap();
        ctx.enter(scope);

        assert!(!ctx.is_rollback_only(tx));
        ctx.mark_rollback_only(tx);
        assert!(ctx.is_rollback_only(tx));
        ctx.reset_rollback_only(tx);
        assert!(!ctx.is_rollback_only(tx));
        ctx.mark_rollback_only(tx);
        assert!(ctx.finish_physical(tx).unwrap().rollback_only);
    }
}
