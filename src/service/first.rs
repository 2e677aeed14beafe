//! The outer service layer.
//!
//! Every operation opens (or deliberately does not open) an outer REQUIRED
//! boundary, saves a user, and calls [`SecondUserService`] with one
//! propagation mode. The names observed on both levels are returned.

use tracing::info;

use crate::service::error::{ServiceError, ServiceResult};
use crate::service::names::TransactionNames;
use crate::service::second::{log_actual_transaction_active, SecondUserService};
use crate::storage::{InMemoryUserStore, User};
use crate::transaction::{PropagationMode, ServiceInvoker, TransactionContext};

/// Whether the outer operation declares its own transactional boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterBoundary {
    /// The outer operation runs in a REQUIRED boundary.
    Transactional,
    /// The outer operation runs without any boundary.
    Absent,
}

impl OuterBoundary {
    /// The boundary each operation declares out of the box: none for
    /// SUPPORTS and MANDATORY, a REQUIRED one for the rest.
    pub fn default_for(mode: PropagationMode) -> Self {
        match mode {
            PropagationMode::Supports | PropagationMode::Mandatory => OuterBoundary::Absent,
            _ => OuterBoundary::Transactional,
        }
    }
}

/// Outer service delegating to [`SecondUserService`].
#[derive(Debug, Clone)]
pub struct FirstUserService {
    invoker: ServiceInvoker,
    users: InMemoryUserStore,
    second: SecondUserService,
}

impl FirstUserService {
    pub const SAVE_AND_EXCEPTION_WITH_REQUIRED_NEW: &'static str =
        "FirstUserService::save_and_exception_with_required_new";

    pub fn new(invoker: ServiceInvoker, users: InMemoryUserStore) -> Self {
        let second = SecondUserService::new(invoker.clone(), users.clone());
        Self {
            invoker,
            users,
            second,
        }
    }

    /// Name of the outer boundary for the operation exercising `mode`.
    pub fn method_name(mode: PropagationMode) -> &'static str {
        match mode {
            PropagationMode::Required => "FirstUserService::save_first_transaction_with_required",
            PropagationMode::RequiresNew => {
                "FirstUserService::save_first_transaction_with_required_new"
            }
            PropagationMode::Supports => "FirstUserService::save_first_transaction_with_supports",
            PropagationMode::Mandatory => "FirstUserService::save_first_transaction_with_mandatory",
            PropagationMode::NotSupported => {
                "FirstUserService::save_first_transaction_with_not_supported"
            }
            PropagationMode::Nested => "FirstUserService::save_first_transaction_with_nested",
            PropagationMode::Never => "FirstUserService::save_first_transaction_with_never",
        }
    }

    pub fn save_first_transaction_with_required(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::Required)
    }

    pub fn save_first_transaction_with_required_new(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::RequiresNew)
    }

    pub fn save_first_transaction_with_supports(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::Supports)
    }

    pub fn save_first_transaction_with_mandatory(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::Mandatory)
    }

    pub fn save_first_transaction_with_not_supported(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::NotSupported)
    }

    pub fn save_first_transaction_with_nested(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::Nested)
    }

    pub fn save_first_transaction_with_never(&self) -> ServiceResult<TransactionNames> {
        self.save_with_default(PropagationMode::Never)
    }

    /// Save a user in the outer boundary, then call the second service with
    /// REQUIRES_NEW, then fail. The outer rolls back; the inner already
    /// committed on its own.
    pub fn save_and_exception_with_required_new(&self) -> ServiceResult<()> {
        let mut ctx = TransactionContext::new();
        self.invoker.invoke(
            &mut ctx,
            Self::SAVE_AND_EXCEPTION_WITH_REQUIRED_NEW,
            PropagationMode::Required,
            |ctx| {
                self.second
                    .save_second_transaction_with(ctx, PropagationMode::RequiresNew)?;
                self.users.save(ctx.current_physical(), User::create_test())?;
                Err(ServiceError::Runtime(
                    "failure after the inner transaction committed".to_string(),
                ))
            },
        )
    }

    /// Run the operation exercising `mode`, with an explicit outer boundary.
    pub fn save_with(
        &self,
        mode: PropagationMode,
        outer: OuterBoundary,
    ) -> ServiceResult<TransactionNames> {
        let mut ctx = TransactionContext::new();
        self.save_with_context(&mut ctx, mode, outer)
    }

    /// Same as [`save_with`](Self::save_with) on a caller-provided context,
    /// which can be inspected afterwards.
    pub fn save_with_context(
        &self,
        ctx: &mut TransactionContext,
        mode: PropagationMode,
        outer: OuterBoundary,
    ) -> ServiceResult<TransactionNames> {
        let names = match outer {
            OuterBoundary::Transactional => self.invoker.invoke(
                ctx,
                Self::method_name(mode),
                PropagationMode::Required,
                |ctx| self.save_and_delegate(ctx, mode),
            )?,
            OuterBoundary::Absent => self.save_and_delegate(ctx, mode)?,
        };

        info!(%mode, ?outer, transactions = %names, physical = ctx.physical_transactions_opened(), "call chain finished");
        Ok(names)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.find_all(None)?)
    }

    pub fn delete_all(&self) {
        self.users.delete_all();
    }

    fn save_with_default(&self, mode: PropagationMode) -> ServiceResult<TransactionNames> {
        self.save_with(mode, OuterBoundary::default_for(mode))
    }

    fn save_and_delegate(
        &self,
        ctx: &mut TransactionContext,
        mode: PropagationMode,
    ) -> ServiceResult<TransactionNames> {
        let first = ctx.current_transaction_name().map(str::to_string);
        self.users.save(ctx.current_physical(), User::create_test())?;
        log_actual_transaction_active(ctx);

        let second = self.second.save_second_transaction_with(ctx, mode)?;
        Ok(TransactionNames::of([first, second]))
    }
}
