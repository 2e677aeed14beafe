//! In-memory user store with per-transaction write buffers.
//!
//! Committed rows live in a shared map. Each open physical transaction keeps
//! its own ordered list of pending writes, so:
//! - a transaction sees committed rows plus its own pending writes
//! - two open transactions never see each other's pending writes
//! - commit replays the pending writes into the committed map
//! - rollback drops them
//!
//! Writes made outside a transaction are committed immediately.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::resource::TransactionalResource;
use crate::storage::types::{SavepointId, TxId, User, UserId};

#[derive(Debug, Clone)]
enum Write {
    Save(User),
    Delete(UserId),
}

#[derive(Debug, Default)]
struct PendingTx {
    writes: Vec<Write>,
    /// (savepoint, number of writes when it was taken)
    savepoints: Vec<(SavepointId, usize)>,
    next_savepoint: u32,
}

/// In-memory user table.
///
/// Clone this to share it - it uses Arc internally.
#[derive(Clone)]
pub struct InMemoryUserStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    committed: RwLock<BTreeMap<UserId, User>>,
    pending: Mutex<HashMap<TxId, PendingTx>>,
    savepoints: bool,
}

impl InMemoryUserStore {
    /// A store without savepoint support.
    pub fn new() -> Self {
        Self::with_savepoints(false)
    }

    /// A store that supports savepoints when `enabled` is set.
    pub fn with_savepoints(enabled: bool) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                committed: RwLock::new(BTreeMap::new()),
                pending: Mutex::new(HashMap::new()),
                savepoints: enabled,
            }),
        }
    }

    /// Save a user, inside `tx` if given, auto-committed otherwise.
    pub fn save(&self, tx: Option<TxId>, user: User) -> StorageResult<User> {
        self.write(tx, Write::Save(user.clone()))?;
        Ok(user)
    }

    /// Delete a user by id.
    pub fn delete(&self, tx: Option<TxId>, id: &UserId) -> StorageResult<()> {
        self.write(tx, Write::Delete(id.clone()))
    }

    /// Every user visible to `tx` (or every committed user).
    pub fn find_all(&self, tx: Option<TxId>) -> StorageResult<Vec<User>> {
        let mut view = self.inner.committed.read().clone();

        if let Some(tx) = tx {
            let pending = self.inner.pending.lock();
            let pending_tx = pending
                .get(&tx)
                .ok_or(StorageError::TransactionNotActive(tx))?;
            for write in &pending_tx.writes {
                apply(&mut view, write.clone());
            }
        }

        Ok(view.into_values().collect())
    }

    /// Number of users visible to `tx`.
    pub fn count(&self, tx: Option<TxId>) -> StorageResult<usize> {
        self.find_all(tx).map(|users| users.len())
    }

    /// Remove every committed user. Open transactions are left alone.
    pub fn delete_all(&self) {
        self.inner.committed.write().clear();
    }

    /// Number of physical transactions currently open.
    pub fn open_transactions(&self) -> usize {
        self.inner.pending.lock().len()
    }

    fn write(&self, tx: Option<TxId>, write: Write) -> StorageResult<()> {
        match tx {
            Some(tx) => {
                let mut pending = self.inner.pending.lock();
                let pending_tx = pending
                    .get_mut(&tx)
                    .ok_or(StorageError::TransactionNotActive(tx))?;
                pending_tx.writes.push(write);
            }
            None => apply(&mut self.inner.committed.write(), write),
        }
        Ok(())
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(rows: &mut BTreeMap<UserId, User>, write: Write) {
    match write {
        Write::Save(user) => {
            rows.insert(user.id.clone(), user);
        }
        Write::Delete(id) => {
            rows.remove(&id);
        }
    }
}

impl TransactionalResource for InMemoryUserStore {
    fn begin(&self, tx: TxId) -> StorageResult<()> {
        let mut pending = self.inner.pending.lock();
        if pending.contains_key(&tx) {
            return Err(StorageError::TransactionAlreadyActive(tx));
        }
        pending.insert(tx, PendingTx::default());
        Ok(())
    }

    fn commit(&self, tx: TxId) -> StorageResult<()> {
        let pending_tx = self
            .inner
            .pending
            .lock()
            .remove(&tx)
            .ok_or(StorageError::TransactionNotActive(tx))?;

        let mut committed = self.inner.committed.write();
        for write in pending_tx.writes {
            apply(&mut committed, write);
        }
        Ok(())
    }

    fn rollback(&self, tx: TxId) -> StorageResult<()> {
        self.inner
            .pending
            .lock()
            .remove(&tx)
            .map(|_| ())
            .ok_or(StorageError::TransactionNotActive(tx))
    }

    fn supports_savepoints(&self) -> bool {
        self.inner.savepoints
    }

    fn create_savepoint(&self, tx: TxId) -> StorageResult<SavepointId> {
        if !self.inner.savepoints {
            return Err(StorageError::SavepointsUnsupported);
        }

        let mut pending = self.inner.pending.lock();
        let pending_tx = pending
            .get_mut(&tx)
            .ok_or(StorageError::TransactionNotActive(tx))?;

        pending_tx.next_savepoint += 1;
        let savepoint = SavepointId::new(tx, pending_tx.next_savepoint);
        let mark = pending_tx.writes.len();
        pending_tx.savepoints.push((savepoint, mark));
        Ok(savepoint)
    }

    fn rollback_to_savepoint(&self, savepoint: SavepointId) -> StorageResult<()> {
        let tx = savepoint.transaction();
        let mut pending = self.inner.pending.lock();
        let pending_tx = pending
            .get_mut(&tx)
            .ok_or(StorageError::TransactionNotActive(tx))?;

        let position = pending_tx
            .savepoints
            .iter()
            .position(|(sp, _)| *sp == savepoint)
            .ok_or(StorageError::SavepointNotFound { tx, savepoint })?;

        let (_, mark) = pending_tx.savepoints[position];
        pending_tx.writes.truncate(mark);
        // later savepoints are gone with the writes they guarded
        pending_tx.savepoints.truncate(position);
        Ok(())
    }

    fn release_savepoint(&self, savepoint: SavepointId) -> StorageResult<()> {
        let tx = savepoint.transaction();
        let mut pending = self.inner.pending.lock();
        let pending_tx = pending
            .get_mut(&tx)
            .ok_or(StorageError::TransactionNotActive(tx))?;

        let position = pending_tx
            .savepoints
            .iter()
            .position(|(sp, _)| *sp == savepoint)
            .ok_or(StorageError::SavepointNotFound { tx, savepoint })?;
        pending_tx.savepoints.remove(position);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserStore")
            .field("committed", &self.inner.committed.read().len())
            .field("open_transactions", &self.open_transactions())
            .field("savepoints", &self.inner.savepoints)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autocommit_without_transaction() {
        let store = InMemoryUserStore::new();
        store.save(None, User::create_test()).unwrap();
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_commit_makes_writes_visible() {
        let store = InMemoryUserStore::new();
        let tx = TxId::generate();
        store.begin(tx).unwrap();

        store.save(Some(tx), User::create_test()).unwrap();
        assert_eq!(store.count(None).unwrap(), 0);
        assert_eq!(store.count(Some(tx)).unwrap(), 1);

        store.commit(tx).unwrap();
        assert_eq!(store.count(None).unwrap(), 1);
        assert_eq!(store.open_transactions(), 0);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let store = InMemoryUserStore::new();
        let tx = TxId::generate();
        store.begin(tx).unwrap();
        store.save(Some(tx), User::create_test()).unwrap();

        store.rollback(tx).unwrap();
        assert_eq!(store.count(None).unwrap(), 0);
        assert!(store.find_all(Some(tx)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_transactions_are_isolated() {
        let store = InMemoryUserStore::new();
        let outer = TxId::generate();
        let inner = TxId::generate();
        store.begin(outer).unwrap();
        store.begin(inner).unwrap();

        store.save(Some(outer), User::create_test()).unwrap();
        store.save(Some(inner), User::create_test()).unwrap();
        assert_eq!(store.count(Some(inner)).unwrap(), 1);

        store.commit(inner).unwrap();
        store.rollback(outer).unwrap();
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let store = InMemoryUserStore::new();
        let tx = TxId::generate();
        store.begin(tx).unwrap();
        assert!(matches!(
            store.begin(tx),
            Err(StorageError::TransactionAlreadyActive(_))
        ));
    }

    #[test]
    fn test_savepoints_unsupported_by_default() {
        let store = InMemoryUserStore::new();
        let tx = TxId::generate();
        store.begin(tx).unwrap();
        assert!(!store.supports_savepoints());
        assert!(matches!(
            store.create_savepoint(tx),
            Err(StorageError::SavepointsUnsupported)
        ));
    }

    #[test]
    fn test_rollback_to_savepoint() {
        let store = InMemoryUserStore::with_savepoints(true);
        let tx = TxId::generate();
        store.begin(tx).unwrap();

        store.save(Some(tx), User::create_test()).unwrap();
        let first = store.create_savepoint(tx).unwrap();
        store.save(Some(tx), User::create_test()).unwrap();
        let second = store.create_savepoint(tx).unwrap();
        store.save(Some(tx), User::create_test()).unwrap();

        store.rollback_to_savepoint(first).unwrap();
        assert_eq!(store.count(Some(tx)).unwrap(), 1);
        // the later savepoint went away with its writes
        assert!(store.rollback_to_savepoint(second).is_err());

        store.commit(tx).unwrap();
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[test]
    fn test_release_savepoint_keeps_writes() {
        let store = InMemoryUserStore::with_savepoints(true);
        let tx = TxId::generate();
        store.begin(tx).unwrap();

        let sp = store.create_savepoint(tx).unwrap();
        store.save(Some(tx), User::create_test()).unwrap();
        store.release_savepoint(sp).unwrap();

        assert_eq!(store.count(Some(tx)).unwrap(), 1);
        assert!(store.release_savepoint(sp).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_inside_transaction() {
        let store = InMemoryUserStore::new();
        let user = store.save(None, User::create_test()).unwrap();

        let tx = TxId::generate();
        store.begin(tx).unwrap();
        store.delete(Some(tx), &user.id).unwrap();
        assert_eq!(store.count(Some(tx)).unwrap(), 0);
        assert_eq!(store.count(None).unwrap(), 1);

        store.commit(tx).unwrap();
        assert_eq!(store.count(None).unwrap(), 0);
    }
}
