use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::state::MemoryState;
use super::transaction::MemoryTransaction;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::{
    IndexDescriptor, RecordStoreProvider, SchemaUpgrade, StoreTransaction, TransactionMode,
    UpgradeHook, WriterLock,
};

/// Volatile record engine. Clones share the same data.
///
/// # Examples
///
/// ```rust
/// use cinder::store::memory::InMemoryStore;
/// use cinder::store::{RecordStoreProvider, TransactionMode};
///
/// let store = InMemoryStore::new();
/// store.open("app", 1, &mut |upgrade| upgrade.create_index("collectionPath", "collectionPath")).unwrap();
/// let tx = store.begin(TransactionMode::ReadOnly).unwrap();
/// assert!(tx.get_all().unwrap().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl RecordStoreProvider for InMemoryStore {
    fn open(&self, name: &str, version: u32, on_upgrade: UpgradeHook<'_>) -> CinderResult<()> {
        self.inner.open(name, version, on_upgrade)
    }

    fn is_opened(&self) -> bool {
        self.inner.name.read().is_some()
    }

    fn name(&self) -> Option<String> {
        self.inner.name.read().clone()
    }

    fn version(&self) -> u32 {
        self.inner.version.load(Ordering::Acquire)
    }

    fn indexes(&self) -> CinderResult<Vec<IndexDescriptor>> {
        Ok(self.inner.state.read().index_descriptors())
    }

    fn begin(&self, mode: TransactionMode) -> CinderResult<StoreTransaction> {
        self.inner.begin(mode)
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    name: RwLock<Option<String>>,
    version: AtomicU32,
    state: Arc<RwLock<MemoryState>>,
    writer: WriterLock,
}

impl InMemoryStoreInner {
    fn open(&self, name: &str, version: u32, on_upgrade: UpgradeHook<'_>) -> CinderResult<()> {
        // no write scope may run while the schema changes
        let _writer = self.writer.acquire()?;
        let mut current_name = self.name.write();

        if let Some(existing) = current_name.as_deref() {
            if existing != name {
                log::error!("Store is already opened as {}, cannot open as {}", existing, name);
                return Err(CinderError::new(
                    &format!("Store is already opened as {}, cannot open as {}", existing, name),
                    ErrorKind::InvalidOperation,
                ));
            }
        }

        let stored_version = self.version.load(Ordering::Acquire);
        if version > stored_version {
            let mut upgrade =
                SchemaUpgrade::new(stored_version, version, self.state.read().index_descriptors());
            on_upgrade(&mut upgrade)?;

            let mut state = self.state.read().clone();
            for descriptor in upgrade.created_indexes() {
                state.create_index(descriptor.clone());
            }
            *self.state.write() = state;
            self.version.store(version, Ordering::Release);
            log::debug!("In-memory store {} upgraded from {} to {}", name, stored_version, version);
        } else {
            log::debug!("In-memory store {} already at version {}", name, stored_version);
        }

        *current_name = Some(name.to_string());
        Ok(())
    }

    fn begin(&self, mode: TransactionMode) -> CinderResult<StoreTransaction> {
        if self.name.read().is_none() {
            log::error!("Store is not opened");
            return Err(CinderError::new("Store is not opened", ErrorKind::StoreError));
        }

        let tx = match mode {
            TransactionMode::ReadOnly => MemoryTransaction::read_only(self.state.clone()),
            TransactionMode::ReadWrite => {
                let writer = self.writer.acquire()?;
                MemoryTransaction::read_write(self.state.clone(), writer)
            }
        };
        Ok(StoreTransaction::new(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    fn opened_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .open("test", 1, &mut |upgrade| {
                upgrade.create_index("collectionPath", "collectionPath")
            })
            .unwrap();
        store
    }

    #[test]
    fn begin_before_open_fails() {
        let store = InMemoryStore::new();
        let err = store.begin(TransactionMode::ReadOnly).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
    }

    #[test]
    fn upgrade_hook_runs_once_per_version_bump() {
        let store = InMemoryStore::new();
        let mut calls = Vec::new();
        store
            .open("db", 1, &mut |u| {
                calls.push((u.old_version(), u.new_version()));
                Ok(())
            })
            .unwrap();
        store
            .open("db", 1, &mut |u| {
                calls.push((u.old_version(), u.new_version()));
                Ok(())
            })
            .unwrap();
        store
            .open("db", 3, &mut |u| {
                calls.push((u.old_version(), u.new_version()));
                Ok(())
            })
            .unwrap();
        store
            .open("db", 2, &mut |u| {
                calls.push((u.old_version(), u.new_version()));
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, vec![(0, 1), (1, 3)]);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn failed_upgrade_leaves_version() {
        let store = InMemoryStore::new();
        let result = store.open("db", 2, &mut |_| {
            Err(CinderError::new("nope", ErrorKind::InternalError))
        });
        assert!(result.is_err());
        assert_eq!(store.version(), 0);
        assert!(!store.is_opened());
    }

    #[test]
    fn open_with_other_name_fails() {
        let store = opened_store();
        let err = store.open("other", 1, &mut |_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn committed_writes_are_visible() {
        let store = opened_store();
        let mut tx = store.begin(TransactionMode::ReadWrite).unwrap();
        tx.put("users/a", doc! { id: "a", collectionPath: "users" }).unwrap();
        assert!(tx.get("users/a").unwrap().is_some());
        tx.commit().unwrap();

        let reader = store.begin(TransactionMode::ReadOnly).unwrap();
        let found = reader.get_all_by_index("collectionPath", &Value::from("users")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn aborted_and_dropped_writes_are_discarded() {
        let store = opened_store();
        let mut tx = store.begin(TransactionMode::ReadWrite).unwrap();
        tx.put("users/a", doc! { id: "a" }).unwrap();
        tx.abort().unwrap();

        {
            let mut tx = store.begin(TransactionMode::ReadWrite).unwrap();
            tx.put("users/b", doc! { id: "b" }).unwrap();
        }

        let reader = store.begin(TransactionMode::ReadOnly).unwrap();
        assert!(reader.get_all().unwrap().is_empty());
    }

    #[test]
    fn readers_see_a_consistent_snapshot() {
        let store = opened_store();
        let reader = store.begin(TransactionMode::ReadOnly).unwrap();

        let mut writer = store.begin(TransactionMode::ReadWrite).unwrap();
        writer.put("users/a", doc! { id: "a" }).unwrap();
        writer.commit().unwrap();

        assert!(reader.get("users/a").unwrap().is_none());
        assert!(store.begin(TransactionMode::ReadOnly).unwrap().get("users/a").unwrap().is_some());
    }

    #[test]
    fn insert_fails_on_existing_key() {
        let store = opened_store();
        let mut tx = store.begin(TransactionMode::ReadWrite).unwrap();
        tx.insert("users/a", doc! { id: "a" }).unwrap();
        let err = tx.insert("users/a", doc! { id: "a" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
    }

    #[test]
    fn delete_absent_key_succeeds() {
        let store = opened_store();
        let mut tx = store.begin(TransactionMode::ReadWrite).unwrap();
        assert!(tx.delete("users/none").is_ok());
        tx.commit().unwrap();
    }

    #[test]
    fn writers_are_serialized() {
        let store = opened_store();
        let first = store.begin(TransactionMode::ReadWrite).unwrap();
        let started = Arc::new(AtomicBool::new(false));

        let store_clone = store.clone();
        let started_clone = started.clone();
        let handle = thread::spawn(move || {
            let tx = store_clone.begin(TransactionMode::ReadWrite).unwrap();
            started_clone.store(true, Ordering::SeqCst);
            tx.commit().unwrap();
        });

        thread::sleep(Duration::from_millis(100));
        assert!(!started.load(Ordering::SeqCst));
        first.commit().unwrap();
        handle.join().unwrap();
        assert!(started.load(Ordering::SeqCst));
    }

    #[test]
    fn nested_write_scope_on_same_thread_fails() {
        let store = opened_store();
        let outer = store.begin(TransactionMode::ReadWrite).unwrap();

        let err = store.begin(TransactionMode::ReadWrite).err().map(|e| e.kind().clone());
        assert_eq!(err, Some(ErrorKind::InvalidOperation));
        assert!(store.begin(TransactionMode::ReadOnly).is_ok());

        let err = store.open("test", 2, &mut |_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

        outer.commit().unwrap();
        assert!(store.begin(TransactionMode::ReadWrite).is_ok());
    }
}
