//! Transaction propagation modes.
//!
//! A propagation mode tells the transaction manager how a new transactional
//! boundary relates to one that is already running:
//! - Required / Supports / Mandatory join an existing transaction
//! - RequiresNew / NotSupported suspend it
//! - Never rejects it, Nested needs savepoints to live inside it

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transaction propagation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropagationMode {
    /// Join the current transaction, or start one if there is none.
    #[default]
    Required,

    /// Always start a new physical transaction, suspending the current one.
    RequiresNew,

    /// Join the current transaction, or run without one.
    Supports,

    /// Join the current transaction; fail if there is none.
    Mandatory,

    /// Run without a transaction, suspending the current one.
    NotSupported,

    /// Run inside a savepoint of the current transaction, or behave like
    /// `Required` if there is none.
    Nested,

    /// Run without a transaction; fail if there is one.
    Never,
}

impl PropagationMode {
    /// Every mode, in declaration order.
    pub const ALL: [PropagationMode; 7] = [
        PropagationMode::Required,
        PropagationMode::RequiresNew,
        PropagationMode::Supports,
        PropagationMode::Mandatory,
        PropagationMode::NotSupported,
        PropagationMode::Nested,
        PropagationMode::Never,
    ];

    /// Upper-case name, e.g. `REQUIRES_NEW`.
    pub fn name(&self) -> &'static str {
        match self {
            PropagationMode::Required => "REQUIRED",
            PropagationMode::RequiresNew => "REQUIRES_NEW",
            PropagationMode::Supports => "SUPPORTS",
            PropagationMode::Mandatory => "MANDATORY",
            PropagationMode::NotSupported => "NOT_SUPPORTED",
            PropagationMode::Nested => "NESTED",
            PropagationMode::Never => "NEVER",
        }
    }
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROPAGATION_{}", self.name())
    }
}

/// Parse a propagation mode (`REQUIRES_NEW`, `requires-new`, `PROPAGATION_NEVER`, ...).
impl std::str::FromStr for PropagationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        let normalized = normalized
            .strip_prefix("PROPAGATION_")
            .unwrap_or(&normalized);

        PropagationMode::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| format!("unknown propagation mode: {}", s))
    }
}
