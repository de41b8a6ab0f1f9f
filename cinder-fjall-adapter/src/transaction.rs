use crate::codec::{decode_record, encode_record, index_key, index_prefix, record_key_of};
use crate::error::{to_cinder_error, FjallStoreError};
use crate::store::{FjallHandles, FjallIndex};
use cinder::collection::Document;
use cinder::common::Value;
use cinder::errors::{CinderError, CinderResult, ErrorKind};
use cinder::store::{StoreTransactionProvider, TransactionMode, WriterGuard};
use parking_lot::lock_api::ArcRwLockReadGuard;
use parking_lot::{RawRwLock, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One scope over a [FjallStore](crate::FjallStore).
///
/// Read-only scopes hold the shared side of the publish lock so that no
/// commit lands while they read. Read-write scopes hold the writer lock,
/// stage every write in memory and apply them in a single batch on commit;
/// `None` in `staged` marks a deletion.
pub(crate) struct FjallTransaction {
    mode: TransactionMode,
    handles: FjallHandles,
    indexes: Vec<FjallIndex>,
    staged: BTreeMap<String, Option<Document>>,
    publish: Option<Arc<RwLock<()>>>,
    sync_on_commit: bool,
    _reader: Option<ArcRwLockReadGuard<RawRwLock, ()>>,
    _writer: Option<WriterGuard>,
}

impl FjallTransaction {
    pub(crate) fn read_only(
        handles: FjallHandles,
        indexes: Vec<FjallIndex>,
        reader: ArcRwLockReadGuard<RawRwLock, ()>,
    ) -> Self {
        FjallTransaction {
            mode: TransactionMode::ReadOnly,
            handles,
            indexes,
            staged: BTreeMap::new(),
            publish: None,
            sync_on_commit: false,
            _reader: Some(reader),
            _writer: None,
        }
    }

    pub(crate) fn read_write(
        handles: FjallHandles,
        indexes: Vec<FjallIndex>,
        publish: Arc<RwLock<()>>,
        writer: WriterGuard,
        sync_on_commit: bool,
    ) -> Self {
        FjallTransaction {
            mode: TransactionMode::ReadWrite,
            handles,
            indexes,
            staged: BTreeMap::new(),
            publish: Some(publish),
            sync_on_commit,
            _reader: None,
            _writer: Some(writer),
        }
    }

    fn committed(&self, key: &str) -> CinderResult<Option<Document>> {
        match self.handles.records.get(key).map_err(to_cinder_error)? {
            Some(bytes) => Ok(Some(decode_record(&bytes).map_err(to_cinder_error)?)),
            None => Ok(None),
        }
    }

    fn find_index(&self, name: &str) -> CinderResult<&FjallIndex> {
        match self.indexes.iter().find(|index| index.descriptor.name() == name) {
            Some(index) => Ok(index),
            None => {
                log::error!("Index {} does not exist", name);
                Err(CinderError::new(
                    &format!("Index {} does not exist", name),
                    ErrorKind::StoreError,
                ))
            }
        }
    }

    fn stage_index_changes(
        &self,
        batch: &mut fjall::Batch,
        key: &str,
        previous: Option<&Document>,
        next: Option<&Document>,
    ) -> CinderResult<()> {
        for index in &self.indexes {
            let field = index.descriptor.field();
            let old_value = previous.and_then(|record| record.get_path(field));
            let new_value = next.and_then(|record| record.get_path(field));
            if old_value == new_value {
                continue;
            }
            if let Some(value) = old_value {
                batch.remove(&index.partition, index_key(value, key).map_err(to_cinder_error)?);
            }
            if let Some(value) = new_value {
                batch.insert(
                    &index.partition,
                    index_key(value, key).map_err(to_cinder_error)?,
                    Vec::<u8>::new(),
                );
            }
        }
        Ok(())
    }
}

impl StoreTransactionProvider for FjallTransaction {
    fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn get(&self, key: &str) -> CinderResult<Option<Document>> {
        match self.staged.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.committed(key),
        }
    }

    fn get_all(&self) -> CinderResult<Vec<Document>> {
        let mut records = BTreeMap::new();
        for entry in self.handles.records.iter() {
            let (key, bytes) = entry.map_err(to_cinder_error)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| to_cinder_error(FjallStoreError::Deserialization(e.to_string())))?;
            records.insert(key, decode_record(&bytes).map_err(to_cinder_error)?);
        }

        for (key, staged) in &self.staged {
            match staged {
                Some(record) => records.insert(key.clone(), record.clone()),
                None => records.remove(key),
            };
        }
        Ok(records.into_values().collect())
    }

    fn get_all_by_index(&self, index: &str, value: &Value) -> CinderResult<Vec<Document>> {
        let index = self.find_index(index)?;
        let prefix = index_prefix(value).map_err(to_cinder_error)?;

        let mut keys = BTreeSet::new();
        for entry in index.partition.prefix(&prefix) {
            let (entry_key, _) = entry.map_err(to_cinder_error)?;
            keys.insert(record_key_of(&entry_key).map_err(to_cinder_error)?);
        }
        keys.extend(self.staged.keys().cloned());

        let field = index.descriptor.field();
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.get(&key)? {
                if record.get_path(field) == Some(value) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    fn put(&mut self, key: &str, record: Document) -> CinderResult<()> {
        self.staged.insert(key.to_string(), Some(record));
        Ok(())
    }

    fn insert(&mut self, key: &str, record: Document) -> CinderResult<()> {
        if self.get(key)?.is_some() {
            log::error!("Key {} already exists", key);
            return Err(CinderError::new(
                &format!("Key {} already exists", key),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        self.put(key, record)
    }

    fn delete(&mut self, key: &str) -> CinderResult<()> {
        self.staged.insert(key.to_string(), None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> CinderResult<()> {
        if self.staged.is_empty() {
            log::debug!("Committed empty {} scope", self.mode);
            return Ok(());
        }

        let mut batch = self.handles.keyspace.batch();
        for (key, staged) in &self.staged {
            let previous = self.committed(key)?;
            self.stage_index_changes(&mut batch, key, previous.as_ref(), staged.as_ref())?;
            match staged {
                Some(record) => {
                    let bytes = encode_record(record).map_err(to_cinder_error)?;
                    batch.insert(&self.handles.records, key.as_str(), bytes);
                }
                None => {
                    if previous.is_some() {
                        batch.remove(&self.handles.records, key.as_str());
                    }
                }
            }
        }

        {
            let _publishing = self.publish.as_ref().map(|publish| publish.write());
            batch.commit().map_err(to_cinder_error)?;
        }
        if self.sync_on_commit {
            self.handles.persist()?;
        }
        log::debug!("Committed {} staged writes", self.staged.len());
        Ok(())
    }

    fn abort(self: Box<Self>) -> CinderResult<()> {
        log::debug!("Aborted {} scope with {} staged writes", self.mode, self.staged.len());
        Ok(())
    }
}
