//! Explicit transactional boundaries around units of work.

use tracing::{debug, warn};

use crate::transaction::context::TransactionContext;
use crate::transaction::error::{RollbackOn, TransactionError};
use crate::transaction::manager::TransactionManager;
use crate::transaction::propagation::PropagationMode;

/// Runs units of work inside transactional boundaries.
///
/// This is the explicit counterpart of a declarative transaction
/// interceptor: every boundary is a call to [`ServiceInvoker::invoke`].
#[derive(Debug, Clone)]
pub struct ServiceInvoker {
    manager: TransactionManager,
}

impl ServiceInvoker {
    pub fn new(manager: TransactionManager) -> Self {
        Self { manager }
    }

    /// Run `body` inside the boundary of `method` with propagation `mode`.
    ///
    /// - Propagation violations are returned before `body` runs.
    /// - If `body` succeeds, what the boundary owns is committed; a failing
    ///   commit is returned as the error.
    /// - If `body` fails, what the boundary owns is rolled back when the
    ///   error requires it (committed otherwise), and the error from `body`
    ///   is returned unchanged.
    pub fn invoke<T, E, F>(
        &self,
        ctx: &mut TransactionContext,
        method: &str,
        mode: PropagationMode,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T, E>,
        E: From<TransactionError> + RollbackOn,
    {
        self.manager.begin(ctx, method, mode)?;

        match body(ctx) {
            Ok(value) => {
                self.manager.commit(ctx)?;
                Ok(value)
            }
            Err(err) => {
                let rollback = err.requires_rollback();
                debug!(method, rollback, "Completing transaction after application error");

                let completion = if rollback {
                    self.manager.rollback(ctx)
                } else {
                    self.manager.commit(ctx)
                };
                if let Err(completion_err) = completion {
                    warn!(method, error = %completion_err, "Application error overridden by completion failure was suppressed");
                }
                Err(err)
            }
        }
    }

    /// Like [`invoke`](Self::invoke), on a fresh context. For top-level calls.
    pub fn execute<T, E, F>(&self, method: &str, mode: PropagationMode, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T, E>,
        E: From<TransactionError> + RollbackOn,
    {
        let mut ctx = TransactionContext::new();
        self.invoke(&mut ctx, method, mode, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use thiserror::Error;

    use crate::storage::{InMemoryUserStore, StorageError, User};

    #[derive(Debug, Error)]
    enum AppError {
        #[error("transaction: {0}")]
        Transaction(#[from] TransactionError),
        #[error("storage: {0}")]
        Storage(#[from] StorageError),
        #[error("boom")]
        Runtime,
        #[error("checked")]
        Checked,
    }

    impl RollbackOn for AppError {
        fn requires_rollback(&self) -> bool {
            !matches!(self, AppError::Checked)
        }
    }

    fn setup() -> (InMemoryUserStore, ServiceInvoker) {
        let store = InMemoryUserStore::new();
        let manager = TransactionManager::new(Arc::new(store.clone()));
        (store, ServiceInvoker::new(manager))
    }

    #[test]
    fn test_invoke_commits_on_success() {
        let (store, invoker) = setup();

        let name = invoker
            .execute("svc::save", PropagationMode::Required, |ctx| {
                store.save(ctx.current_physical(), User::create_test())?;
                Ok::<_, AppError>(ctx.current_transaction_name().map(str::to_string))
            })
            .unwrap();

        assert_eq!(name.as_deref(), Some("svc::save"));
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_invoke_rolls_back_and_returns_original_error() {
        let (store, invoker) = setup();

        let err = invoker
            .execute("svc::save", PropagationMode::Required, |ctx| {
                store.save(ctx.current_physical(), User::create_test())?;
                Err::<(), _>(AppError::Runtime)
            })
            .unwrap_err();

        assert!(matches!(err, AppError::Runtime));
        assert_eq!(store.count(None).unwrap(), 0);
        assert_eq!(store.open_transactions(), 0);
    }

    #[test]
    fn test_checked_error_still_commits() {
        let (store, invoker) = setup();

        let err = invoker
            .execute("svc::save", PropagationMode::Required, |ctx| {
                store.save(ctx.current_physical(), User::create_test())?;
                Err::<(), _>(AppError::Checked)
            })
            .unwrap_err();

        assert!(matches!(err, AppError::Checked));
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_violation_skips_body() {
        let (_store, invoker) = setup();
        let mut ran = false;

        let err = invoker
            .execute("svc::save", PropagationMode::Mandatory, |_ctx| {
                ran = true;
                Ok::<_, AppError>(())
            })
            .unwrap_err();

        assert!(!ran);
        assert!(matches!(
            err,
            AppError::Transaction(TransactionError::IllegalTransactionState { .. })
        ));
    }

    #[test]
    fn test_swallowed_participant_failure_surfaces_as_unexpected_rollback() {
        let (store, invoker) = setup();

        let err = invoker
            .execute("svc::outer", PropagationMode::Required, |ctx| {
                store.save(ctx.current_physical(), User::create_test())?;
                let inner = invoker.invoke(ctx, "svc::inner", PropagationMode::Required, |_ctx| {
                    Err::<(), _>(AppError::Runtime)
                });
                assert!(inner.is_err());
                Ok::<_, AppError>(())
            })
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Transaction(TransactionError::UnexpectedRollback { .. })
        ));
        assert_eq!(store.count(None).unwrap(), 0);
    }
}
