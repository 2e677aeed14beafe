//! The inner service layer.

use tracing::info;

use crate::service::error::ServiceResult;
use crate::storage::{InMemoryUserStore, User};
use crate::transaction::{PropagationMode, ServiceInvoker, TransactionContext};

/// Saves one user inside a boundary of the requested propagation mode.
#[derive(Debug, Clone)]
pub struct SecondUserService {
    invoker: ServiceInvoker,
    users: InMemoryUserStore,
}

impl SecondUserService {
    pub fn new(invoker: ServiceInvoker, users: InMemoryUserStore) -> Self {
        Self { invoker, users }
    }

    /// Name of the boundary this service declares for `mode`.
    pub fn method_name(mode: PropagationMode) -> &'static str {
        match mode {
            PropagationMode::Required => "SecondUserService::save_second_transaction_with_required",
            PropagationMode::RequiresNew => {
                "SecondUserService::save_second_transaction_with_requires_new"
            }
            PropagationMode::Supports => "SecondUserService::save_second_transaction_with_supports",
            PropagationMode::Mandatory => {
                "SecondUserService::save_second_transaction_with_mandatory"
            }
            PropagationMode::NotSupported => {
                "SecondUserService::save_second_transaction_with_not_supported"
            }
            PropagationMode::Nested => "SecondUserService::save_second_transaction_with_nested",
            PropagationMode::Never => "SecondUserService::save_second_transaction_with_never",
        }
    }

    /// Save a test user inside a `mode` boundary and return the transaction
    /// name seen inside it.
    pub fn save_second_transaction_with(
        &self,
        ctx: &mut TransactionContext,
        mode: PropagationMode,
    ) -> ServiceResult<Option<String>> {
        self.invoker
            .invoke(ctx, Self::method_name(mode), mode, |ctx| {
                self.users.save(ctx.current_physical(), User::create_test())?;
                log_actual_transaction_active(ctx);
                Ok(ctx.current_transaction_name().map(str::to_string))
            })
    }
}

pub(crate) fn log_actual_transaction_active(ctx: &TransactionContext) {
    info!(
        current_transaction_name = ?ctx.current_transaction_name(),
        actual_transaction_active = ctx.is_physical_open(),
        suspended = ctx.suspended_count(),
        "transaction state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::transaction::TransactionManager;

    #[test]
    fn test_method_names_are_distinct() {
        let mut names: Vec<_> = PropagationMode::ALL
            .iter()
            .map(|mode| SecondUserService::method_name(*mode))
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PropagationMode::ALL.len());
    }

    #[test]
    fn test_standalone_call_records_own_name() {
        let store = InMemoryUserStore::new();
        let invoker = ServiceInvoker::new(TransactionManager::new(Arc::new(store.clone())));
        let service = SecondUserService::new(invoker, store.clone());
        let mut ctx = TransactionContext::new();

        let name = service
            .save_second_transaction_with(&mut ctx, PropagationMode::Never)
            .unwrap();

        assert_eq!(
            name.as_deref(),
            Some(SecondUserService::method_name(PropagationMode::Never))
        );
        assert_eq!(ctx.physical_transactions_opened(), 0);
        assert_eq!(store.count(None).unwrap(), 1);
    }
}
