//! Transaction manager - decides and drives propagation.
//!
//! The TransactionManager is the main entry point for transactions.
//! It handles:
//! - Deciding what a boundary does given its propagation mode
//! - Beginning, suspending, joining and savepointing physical transactions
//! - Committing or rolling back what a boundary owns
//! - Marking shared transactions rollback-only when a participant fails

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, trace};

use crate::storage::{StorageError, TransactionalResource, TxId};
use crate::transaction::config::TransactionManagerConfig;
use crate::transaction::context::{LogicalTransaction, Participation, TransactionContext};
use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::propagation::PropagationMode;

/// What a transactional boundary does when it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Participate in the outer physical transaction.
    Join,
    /// Begin a new physical transaction, suspending the outer one if any.
    NewPhysical,
    /// Run without a physical transaction; there is no outer one.
    NoPhysical,
    /// Suspend the outer physical transaction and run without one.
    SuspendAndRun,
    /// Run inside a savepoint of the outer physical transaction.
    Savepoint,
    /// The mode needs an outer transaction and there is none.
    RejectNoOuter,
    /// The mode forbids the outer transaction that exists.
    RejectHasOuter,
}

/// Transaction manager - coordinates all transaction operations.
///
/// Cheap to clone: the resource and config are shared via Arc.
#[derive(Clone)]
pub struct TransactionManager {
    inner: Arc<TransactionManagerInner>,
}

struct TransactionManagerInner {
    config: TransactionManagerConfig,
    resource: Arc<dyn TransactionalResource>,
}

impl TransactionManager {
    /// Create a transaction manager with the default configuration.
    pub fn new(resource: Arc<dyn TransactionalResource>) -> Self {
        Self::with_config(resource, TransactionManagerConfig::default())
    }

    /// Create a transaction manager with a specific configuration.
    pub fn with_config(
        resource: Arc<dyn TransactionalResource>,
        config: TransactionManagerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(TransactionManagerInner { config, resource }),
        }
    }

    /// Decide what a boundary with `mode` does, given whether an outer
    /// physical transaction is active.
    pub fn decide(&self, mode: PropagationMode, has_active: bool) -> Action {
        use PropagationMode::*;

        match (mode, has_active) {
            (Required, false) | (RequiresNew, _) | (Nested, false) => Action::NewPhysical,
            (Required, true) | (Supports, true) | (Mandatory, true) => Action::Join,
            (Supports, false) | (NotSupported, false) | (Never, false) => Action::NoPhysical,
            (Mandatory, false) => Action::RejectNoOuter,
            (NotSupported, true) => Action::SuspendAndRun,
            (Nested, true) if self.inner.config.nested_transaction_allowed => Action::Savepoint,
            (Nested, true) | (Never, true) => Action::RejectHasOuter,
        }
    }

    /// Enter the boundary of `method` with `mode`.
    ///
    /// Rejections are returned before anything is pushed on the context or
    /// touched on the resource.
    pub fn begin(
        &self,
        ctx: &mut TransactionContext,
        method: &str,
        mode: PropagationMode,
    ) -> TransactionResult<()> {
        let outer = ctx.current_physical();
        let action = self.decide(mode, outer.is_some());
        trace!(method, %mode, ?action, "propagation decided");

        let scope = match action {
            Action::RejectNoOuter => {
                return Err(TransactionError::illegal_state(
                    method,
                    mode,
                    "no existing transaction found for transaction marked with propagation 'mandatory'",
                ));
            }
            Action::RejectHasOuter if mode == PropagationMode::Nested => {
                return Err(TransactionError::NestedNotSupported {
                    name: method.to_string(),
                    reason: "transaction manager does not allow nested transactions",
                });
            }
            Action::RejectHasOuter => {
                return Err(TransactionError::illegal_state(
                    method,
                    mode,
                    "existing transaction found for transaction marked with propagation 'never'",
                ));
            }
            Action::Join => {
                debug!(method, "Participating in existing transaction");
                let name = ctx.current_transaction_name().unwrap_or(method).to_string();
                LogicalTransaction::new(name, method, mode, outer, Participation::Participant)
            }
            Action::NewPhysical => {
                let id = TxId::generate();
                if let Some(outer) = outer {
                    debug!(method, outer = %outer.short(), "Suspending current transaction, creating new transaction");
                }
                debug!(method, tx = %id.short(), %mode, "Creating new transaction");
                self.inner.resource.begin(id)?;
                LogicalTransaction::new(method, method, mode, Some(id), Participation::Owner)
                    .suspending(outer)
            }
            Action::NoPhysical => {
                // an outer synchronization-only scope keeps its name
                let name = ctx.current_transaction_name().unwrap_or(method).to_string();
                debug!(method, %mode, "Running without physical transaction");
                LogicalTransaction::new(name, method, mode, None, Participation::NonTransactional)
            }
            Action::SuspendAndRun => {
                if let Some(outer) = outer {
                    debug!(method, outer = %outer.short(), "Suspending current transaction");
                }
                LogicalTransaction::new(method, method, mode, None, Participation::NonTransactional)
                    .suspending(outer)
            }
            Action::Savepoint => {
                let outer = outer.ok_or_else(|| {
                    TransactionError::Internal("savepoint requested without outer transaction".into())
                })?;
                let savepoint = self
                    .inner
                    .resource
                    .create_savepoint(outer)
                    .map_err(|e| match e {
                        StorageError::SavepointsUnsupported => TransactionError::NestedNotSupported {
                            name: method.to_string(),
                            reason: "resource does not support savepoints",
                        },
                        other => TransactionError::Storage(other),
                    })?;
                debug!(method, %savepoint, "Creating nested transaction");
                let name = ctx.current_transaction_name().unwrap_or(method).to_string();
                LogicalTransaction::new(
                    name,
                    method,
                    mode,
                    Some(outer),
                    Participation::Savepoint(savepoint),
                )
            }
        };

        ctx.enter(scope);
        Ok(())
    }

    /// Leave the innermost boundary after its work succeeded.
    ///
    /// Owners commit; a rollback-only transaction is rolled back instead and
    /// reported as [`TransactionError::UnexpectedRollback`].
    pub fn commit(&self, ctx: &mut TransactionContext) -> TransactionResult<()> {
        let scope = ctx.leave()?;

        let result = match scope.participation {
            Participation::Owner => self.complete_owned(ctx, &scope, true),
            Participation::Savepoint(savepoint) => {
                debug!(method = %scope.method, %savepoint, "Releasing transaction savepoint");
                self.inner
                    .resource
                    .release_savepoint(savepoint)
                    .map_err(TransactionError::from)
            }
            Participation::Participant | Participation::NonTransactional => Ok(()),
        };

        self.resume(&scope);
        result
    }

    /// Leave the innermost boundary after its work failed with an error that
    /// requires rollback.
    ///
    /// Only what the boundary owns is rolled back. A failed participant marks
    /// the shared transaction rollback-only (unless configured otherwise).
    pub fn rollback(&self, ctx: &mut TransactionContext) -> TransactionResult<()> {
        let scope = ctx.leave()?;

        let result = match scope.participation {
            Participation::Owner => self.complete_owned(ctx, &scope, false),
            Participation::Savepoint(savepoint) => {
                debug!(method = %scope.method, %savepoint, "Rolling back transaction to savepoint");
                self.inner
                    .resource
                    .rollback_to_savepoint(savepoint)
                    .map(|()| {
                        // the failed work is undone, so the outer transaction may still commit
                        if let Some(id) = scope.physical {
                            ctx.reset_rollback_only(id);
                        }
                    })
                    .map_err(TransactionError::from)
            }
            Participation::Participant => {
                if let Some(id) = scope.physical {
                    if self.inner.config.global_rollback_on_participation_failure {
                        debug!(method = %scope.method, "Participating transaction failed - marking existing transaction as rollback-only");
                        ctx.mark_rollback_only(id);
                    } else {
                        debug!(method = %scope.method, "Participating transaction failed - letting transaction originator decide on rollback");
                    }
                }
                Ok(())
            }
            Participation::NonTransactional => Ok(()),
        };

        self.resume(&scope);
        result
    }

    fn complete_owned(
        &self,
        ctx: &mut TransactionContext,
        scope: &LogicalTransaction,
        commit: bool,
    ) -> TransactionResult<()> {
        let id = scope.physical.ok_or_else(|| {
            TransactionError::Internal(format!("'{}' owns no physical transaction", scope.method))
        })?;
        let physical = ctx.finish_physical(id)?;
        let elapsed_ms = (Utc::now() - physical.started_at).num_milliseconds();

        if !commit {
            debug!(name = %physical.name, tx = %id.short(), elapsed_ms, "Initiating transaction rollback");
            self.inner.resource.rollback(id)?;
            return Ok(());
        }

        if physical.rollback_only {
            debug!(name = %physical.name, tx = %id.short(), elapsed_ms, "Global transaction is marked as rollback-only but transactional code requested commit");
            self.inner.resource.rollback(id)?;
            return Err(TransactionError::UnexpectedRollback {
                name: physical.name,
            });
        }

        debug!(name = %physical.name, tx = %id.short(), elapsed_ms, "Initiating transaction commit");
        self.inner.resource.commit(id)?;
        Ok(())
    }

    fn resume(&self, scope: &LogicalTransaction) {
        if let Some(outer) = scope.suspended {
            debug!(method = %scope.method, outer = %outer.short(), "Resuming suspended transaction");
        }
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("config", &self.inner.config)
            .field("savepoints", &self.inner.resource.supports_savepoints())
            .finish()
    }
}
