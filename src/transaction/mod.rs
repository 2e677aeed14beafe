//! Transaction propagation for txprop.
//!
//! This module decides, for every transactional boundary, whether it joins the
//! transaction already running, begins its own physical transaction, runs
//! without one, or is rejected. Physical transactions are begun, committed and
//! rolled back on a [`TransactionalResource`](crate::storage::TransactionalResource).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ServiceInvoker                          │
//! │        (explicit boundary: invoke(ctx, name, mode))         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransactionManager                        │
//! │  (decide Action, begin/suspend/join, commit/rollback)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ Transaction │       │ Propagation │       │  Resource   │
//!  │   Context   │       │    Mode     │       │   (hooks)   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use txprop::storage::{InMemoryUserStore, User};
//! use txprop::transaction::{
//!     PropagationMode, ServiceInvoker, TransactionError, TransactionManager,
//! };
//!
//! let store = InMemoryUserStore::new();
//! let invoker = ServiceInvoker::new(TransactionManager::new(Arc::new(store.clone())));
//!
//! invoker
//!     .execute("users::save", PropagationMode::Required, |ctx| {
//!         store.save(ctx.current_physical(), User::create_test())?;
//!         Ok::<_, TransactionError>(())
//!     })
//!     .unwrap();
//! assert_eq!(store.count(None).unwrap(), 1);
//! ```

mod config;
mod context;
mod error;
mod invoker;
mod manager;
mod propagation;

pub use config::TransactionManagerConfig;
pub use context::{
    LogicalTransaction, Participation, PhysicalTransaction, TransactionContext, TransactionRecord,
};
pub use error::{RollbackOn, TransactionError, TransactionResult};
pub use invoker::ServiceInvoker;
pub use manager::{Action, TransactionManager};
pub use propagation::PropagationMode;
