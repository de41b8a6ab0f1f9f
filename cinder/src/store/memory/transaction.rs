use parking_lot::RwLock;
use std::sync::Arc;

use super::state::MemoryState;
use crate::collection::Document;
use crate::common::Value;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::{StoreTransactionProvider, TransactionMode, WriterGuard};

pub(crate) struct MemoryTransaction {
    mode: TransactionMode,
    working: MemoryState,
    published: Arc<RwLock<MemoryState>>,
    // held from begin until commit or abort
    writer: Option<WriterGuard>,
}

impl MemoryTransaction {
    pub(crate) fn read_only(published: Arc<RwLock<MemoryState>>) -> Self {
        let working = published.read().clone();
        MemoryTransaction {
            mode: TransactionMode::ReadOnly,
            working,
            published,
            writer: None,
        }
    }

    pub(crate) fn read_write(
        published: Arc<RwLock<MemoryState>>,
        writer: WriterGuard,
    ) -> Self {
        let working = published.read().clone();
        MemoryTransaction {
            mode: TransactionMode::ReadWrite,
            working,
            published,
            writer: Some(writer),
        }
    }
}

impl StoreTransactionProvider for MemoryTransaction {
    fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn get(&self, key: &str) -> CinderResult<Option<Document>> {
        Ok(self.working.get(key).cloned())
    }

    fn get_all(&self) -> CinderResult<Vec<Document>> {
        Ok(self.working.values())
    }

    fn get_all_by_index(&self, index: &str, value: &Value) -> CinderResult<Vec<Document>> {
        self.working.lookup(index, value)
    }

    fn put(&mut self, key: &str, record: Document) -> CinderResult<()> {
        self.working.put(key, record);
        Ok(())
    }

    fn insert(&mut self, key: &str, record: Document) -> CinderResult<()> {
        if self.working.contains_key(key) {
            log::error!("Key {} already exists", key);
            return Err(CinderError::new(
                &format!("Key {} already exists", key),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        self.working.put(key, record);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> CinderResult<()> {
        self.working.remove(key);
        Ok(())
    }

    fn commit(self: Box<Self>) -> CinderResult<()> {
        let this = *self;
        if this.mode == TransactionMode::ReadWrite {
            *this.published.write() = this.working;
            log::debug!("In-memory transaction committed");
        }
        drop(this.writer);
        Ok(())
    }

    fn abort(self: Box<Self>) -> CinderResult<()> {
        log::debug!("In-memory {} transaction aborted", self.mode);
        Ok(())
    }
}
