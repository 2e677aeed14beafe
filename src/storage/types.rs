//! core identifiers and the user entity stored by the in-memory store.

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a physical transaction.
///
/// Every physical transaction opened against a resource gets a fresh ULID,
/// so ids sort by creation time and never repeat within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(Ulid);

impl TxId {
    /// generate a new transaction id
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// short form of the id, handy in log lines
    pub fn short(&self) -> String {
        let full = self.to_string();
        full[full.len() - 8..].to_string()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

/// A savepoint inside one physical transaction.
///
/// Only meaningful to the resource that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SavepointId {
    pub(crate) tx: TxId,
    pub(crate) seq: u32,
}

impl SavepointId {
    pub(crate) fn new(tx: TxId, seq: u32) -> Self {
        Self { tx, seq }
    }

    /// the physical transaction this savepoint belongs to
    pub fn transaction(&self) -> TxId {
        self.tx
    }
}

impl fmt::Display for SavepointId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SAVEPOINT_{}", self.seq)
    }
}

/// Primary key of a stored user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// generate a new unique key (ULID)
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub account: String,
    pub password: String,
    pub email: String,
}

impl User {
    pub fn new(
        account: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            account: account.into(),
            password: password.into(),
            email: email.into(),
        }
    }

    /// The fixture user every service method saves.
    pub fn create_test() -> Self {
        Self::new("gugu", "password", "hkkang@woowahan.com")
    }
}
