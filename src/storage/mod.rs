//! storage layer for txprop
//!
//! This module is the persistence collaborator of the transaction layer. The
//! transaction layer only talks to it through [`TransactionalResource`]:
//! begin, commit, rollback and (optionally) savepoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TransactionalResource                       │
//! │      (begin / commit / rollback / savepoint hooks)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │  InMemoryUserStore  │
//!                   │ committed + pending │
//!                   └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use txprop::storage::{InMemoryUserStore, TransactionalResource, TxId, User};
//!
//! let store = InMemoryUserStore::new();
//! let tx = TxId::generate();
//! store.begin(tx).unwrap();
//! store.save(Some(tx), User::create_test()).unwrap();
//! store.commit(tx).unwrap();
//! assert_eq!(store.count(None).unwrap(), 1);
//! ```

mod error;
mod memory;
mod resource;
mod types;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryUserStore;
pub use resource::TransactionalResource;
pub use types::{SavepointId, TxId, User, UserId};
