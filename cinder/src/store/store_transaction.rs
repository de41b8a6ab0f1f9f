use crate::collection::Document;
use crate::common::Value;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use std::fmt::{Display, Formatter};

/// Access mode of a store scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Any number of read-only scopes may run concurrently.
    ReadOnly,
    /// Read-write scopes are serialized by the engine's writer lock.
    ReadWrite,
}

impl Display for TransactionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionMode::ReadOnly => write!(f, "readonly"),
            TransactionMode::ReadWrite => write!(f, "readwrite"),
        }
    }
}

/// One engine scope.
///
/// Reads observe the scope's own earlier writes. Nothing is visible to
/// other scopes until [commit](StoreTransactionProvider::commit) returns;
/// dropping a scope without committing discards its writes.
pub trait StoreTransactionProvider {
    fn mode(&self) -> TransactionMode;

    fn get(&self, key: &str) -> CinderResult<Option<Document>>;

    /// Every record, in key order.
    fn get_all(&self) -> CinderResult<Vec<Document>>;

    /// Records whose indexed field equals `value`, in key order.
    fn get_all_by_index(&self, index: &str, value: &Value) -> CinderResult<Vec<Document>>;

    /// Creates or overwrites the record under `key`.
    fn put(&mut self, key: &str, record: Document) -> CinderResult<()>;

    /// Creates the record under `key`, failing with
    /// [ErrorKind::UniqueConstraintViolation] if it already exists.
    fn insert(&mut self, key: &str, record: Document) -> CinderResult<()>;

    /// Removes the record under `key`; removing an absent key succeeds.
    fn delete(&mut self, key: &str) -> CinderResult<()>;

    fn commit(self: Box<Self>) -> CinderResult<()>;

    fn abort(self: Box<Self>) -> CinderResult<()>;
}

/// Owning handle over an engine scope.
pub struct StoreTransaction {
    inner: Box<dyn StoreTransactionProvider>,
}

impl StoreTransaction {
    pub fn new<T: StoreTransactionProvider + 'static>(inner: T) -> Self {
        StoreTransaction { inner: Box::new(inner) }
    }

    pub fn mode(&self) -> TransactionMode {
        self.inner.mode()
    }

    pub fn get(&self, key: &str) -> CinderResult<Option<Document>> {
        self.inner.get(key)
    }

    pub fn get_all(&self) -> CinderResult<Vec<Document>> {
        self.inner.get_all()
    }

    pub fn get_all_by_index(&self, index: &str, value: &Value) -> CinderResult<Vec<Document>> {
        self.inner.get_all_by_index(index, value)
    }

    pub fn put(&mut self, key: &str, record: Document) -> CinderResult<()> {
        self.check_writable()?;
        self.inner.put(key, record)
    }

    pub fn insert(&mut self, key: &str, record: Document) -> CinderResult<()> {
        self.check_writable()?;
        self.inner.insert(key, record)
    }

    pub fn delete(&mut self, key: &str) -> CinderResult<()> {
        self.check_writable()?;
        self.inner.delete(key)
    }

    pub fn commit(self) -> CinderResult<()> {
        self.inner.commit()
    }

    pub fn abort(self) -> CinderResult<()> {
        self.inner.abort()
    }

    fn check_writable(&self) -> CinderResult<()> {
        if self.inner.mode() == TransactionMode::ReadOnly {
            log::error!("Cannot write in a readonly transaction");
            return Err(CinderError::new(
                "Cannot write in a readonly transaction",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    struct MockTransaction {
        mode: TransactionMode,
        records: BTreeMap<String, Document>,
        committed: Rc<RefCell<bool>>,
    }

    impl StoreTransactionProvider for MockTransaction {
        fn mode(&self) -> TransactionMode {
            self.mode
        }

        fn get(&self, key: &str) -> CinderResult<Option<Document>> {
            Ok(self.records.get(key).cloned())
        }

        fn get_all(&self) -> CinderResult<Vec<Document>> {
            Ok(self.records.values().cloned().collect())
        }

        fn get_all_by_index(&self, _index: &str, _value: &Value) -> CinderResult<Vec<Document>> {
            Ok(vec![])
        }

        fn put(&mut self, key: &str, record: Document) -> CinderResult<()> {
            self.records.insert(key.to_string(), record);
            Ok(())
        }

        fn insert(&mut self, key: &str, record: Document) -> CinderResult<()> {
            self.put(key, record)
        }

        fn delete(&mut self, key: &str) -> CinderResult<()> {
            self.records.remove(key);
            Ok(())
        }

        fn commit(self: Box<Self>) -> CinderResult<()> {
            *self.committed.borrow_mut() = true;
            Ok(())
        }

        fn abort(self: Box<Self>) -> CinderResult<()> {
            Ok(())
        }
    }

    fn mock(mode: TransactionMode) -> (StoreTransaction, Rc<RefCell<bool>>) {
        let committed = Rc::new(RefCell::new(false));
        let tx = StoreTransaction::new(MockTransaction {
            mode,
            records: BTreeMap::new(),
            committed: committed.clone(),
        });
        (tx, committed)
    }

    #[test]
    fn readonly_scope_rejects_writes() {
        let (mut tx, _) = mock(TransactionMode::ReadOnly);
        assert_eq!(tx.put("a/1", doc! { x: 1 }).unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(tx.insert("a/1", doc! { x: 1 }).unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(tx.delete("a/1").unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn readwrite_scope_delegates() {
        let (mut tx, committed) = mock(TransactionMode::ReadWrite);
        tx.put("a/1", doc! { x: 1 }).unwrap();
        assert_eq!(tx.get("a/1").unwrap(), Some(doc! { x: 1 }));
        assert_eq!(tx.get_all().unwrap().len(), 1);
        tx.commit().unwrap();
        assert!(*committed.borrow());
    }

    #[test]
    fn mode_display() {
        assert_eq!(TransactionMode::ReadOnly.to_string(), "readonly");
        assert_eq!(TransactionMode::ReadWrite.to_string(), "readwrite");
    }
}
