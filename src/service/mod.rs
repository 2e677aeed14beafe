//! Two nested user services that exercise every propagation mode.
//!
//! [`FirstUserService`] opens the outer boundary and calls
//! [`SecondUserService`], whose boundary uses the mode under test. Both record
//! the transaction name they see, so the returned [`TransactionNames`] tell how
//! many logical transactions the call chain went through.

mod error;
mod first;
mod names;
mod second;

use std::sync::Arc;

pub use error::{ServiceError, ServiceResult};
pub use first::{FirstUserService, OuterBoundary};
pub use names::TransactionNames;
pub use second::SecondUserService;

use crate::storage::InMemoryUserStore;
use crate::transaction::{ServiceInvoker, TransactionManager, TransactionManagerConfig};

/// Wire both services onto `store` with a manager built from `config`.
pub fn user_services(store: InMemoryUserStore, config: TransactionManagerConfig) -> FirstUserService {
    let manager = TransactionManager::with_config(Arc::new(store.clone()), config);
    FirstUserService::new(ServiceInvoker::new(manager), store)
}
