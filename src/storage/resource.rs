//! The hooks a transactional resource exposes to the transaction layer.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{SavepointId, TxId};

/// A resource that can take part in physical transactions.
///
/// The transaction layer decides *when* to begin, commit or roll back; the
/// resource decides what that means for its data. Savepoint support is
/// optional and off by default.
pub trait TransactionalResource: Send + Sync {
    /// Open a physical transaction.
    fn begin(&self, tx: TxId) -> StorageResult<()>;

    /// Make every write of `tx` visible and close it.
    fn commit(&self, tx: TxId) -> StorageResult<()>;

    /// Discard every write of `tx` and close it.
    fn rollback(&self, tx: TxId) -> StorageResult<()>;

    /// Whether `create_savepoint` can succeed.
    fn supports_savepoints(&self) -> bool {
        false
    }

    /// Mark the current position inside `tx`.
    fn create_savepoint(&self, _tx: TxId) -> StorageResult<SavepointId> {
        Err(StorageError::SavepointsUnsupported)
    }

    /// Discard the writes made after `savepoint`. The transaction stays open.
    fn rollback_to_savepoint(&self, _savepoint: SavepointId) -> StorageResult<()> {
        Err(StorageError::SavepointsUnsupported)
    }

    /// Forget `savepoint`, keeping its writes.
    fn release_savepoint(&self, _savepoint: SavepointId) -> StorageResult<()> {
        Err(StorageError::SavepointsUnsupported)
    }
}
