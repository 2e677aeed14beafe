//! txprop - a transaction propagation simulator
//!
//! This crate reproduces how a declarative transaction manager treats nested
//! transactional boundaries. Every boundary is an explicit
//! `invoke(ctx, name, mode, body)` call; the manager decides whether it joins,
//! begins, suspends, savepoints or rejects, and an in-memory store shows which
//! writes survive.
//!
//! # Example
//!
//! ```
//! use txprop::service::user_services;
//! use txprop::storage::InMemoryUserStore;
//! use txprop::transaction::TransactionManagerConfig;
//!
//! let first = user_services(InMemoryUserStore::new(), TransactionManagerConfig::default());
//!
//! let names = first.save_first_transaction_with_required_new().unwrap();
//! assert_eq!(names.len(), 2);
//!
//! let err = first.save_first_transaction_with_never().unwrap_err();
//! assert!(err.is_illegal_transaction_state());
//! ```

pub mod pattern;
pub mod service;
pub mod storage;
pub mod transaction;
