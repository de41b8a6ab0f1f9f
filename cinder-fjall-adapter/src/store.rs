use crate::builder::FjallStoreBuilder;
use crate::codec::{decode, decode_record, encode, index_key};
use crate::config::FjallConfig;
use crate::error::{to_cinder_error, FjallStoreError};
use crate::transaction::FjallTransaction;
use cinder::errors::{CinderError, CinderResult, ErrorKind};
use cinder::store::{
    IndexDescriptor, RecordStoreProvider, SchemaUpgrade, StoreTransaction, TransactionMode,
    UpgradeHook, WriterLock,
};
use fjall::{Batch, Keyspace, PartitionHandle, PersistMode};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

const RECORDS_PARTITION: &str = "records";
const META_PARTITION: &str = "meta";
const INDEX_PARTITION_PREFIX: &str = "index_";

const META_NAME: &str = "name";
const META_VERSION: &str = "version";
const META_INDEXES: &str = "indexes";

/// Persistent record engine backed by a Fjall keyspace.
///
/// Records live in the `records` partition keyed by document path, every
/// secondary index in its own `index_<name>` partition, and the database
/// name, schema version and index catalog in `meta`. A read-write scope
/// stages its writes in memory and commits them as one atomic Fjall batch.
///
/// The keyspace is opened by the first call to
/// [open](RecordStoreProvider::open) and released when the last clone is
/// dropped.
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    /// Creates a builder for configuring a store.
    #[inline]
    pub fn with_config() -> FjallStoreBuilder {
        FjallStoreBuilder::new()
    }

    #[inline]
    pub(crate) fn new(config: FjallConfig) -> FjallStore {
        FjallStore {
            inner: Arc::new(FjallStoreInner::new(config)),
        }
    }

    pub fn config(&self) -> FjallConfig {
        self.inner.config.clone()
    }

    /// Blocks until all committed data is durable on disk.
    pub fn persist(&self) -> CinderResult<()> {
        match self.inner.handles.get() {
            Some(handles) => handles.persist(),
            None => Ok(()),
        }
    }
}

impl RecordStoreProvider for FjallStore {
    fn open(&self, name: &str, version: u32, on_upgrade: UpgradeHook<'_>) -> CinderResult<()> {
        self.inner.open(name, version, on_upgrade)
    }

    fn is_opened(&self) -> bool {
        self.inner.opened.load(Ordering::Acquire)
    }

    fn name(&self) -> Option<String> {
        self.inner.name.read().clone()
    }

    fn version(&self) -> u32 {
        self.inner.version.load(Ordering::Acquire)
    }

    fn indexes(&self) -> CinderResult<Vec<IndexDescriptor>> {
        Ok(self
            .inner
            .indexes
            .read()
            .iter()
            .map(|index| index.descriptor.clone())
            .collect())
    }

    fn begin(&self, mode: TransactionMode) -> CinderResult<StoreTransaction> {
        self.inner.begin(mode)
    }
}

/// Open keyspace plus its fixed partitions.
#[derive(Clone)]
pub(crate) struct FjallHandles {
    pub(crate) keyspace: Keyspace,
    pub(crate) records: PartitionHandle,
    pub(crate) meta: PartitionHandle,
}

impl FjallHandles {
    fn open(config: &FjallConfig) -> CinderResult<FjallHandles> {
        let keyspace = Keyspace::open(config.keyspace_config()).map_err(to_cinder_error)?;
        let records = keyspace
            .open_partition(RECORDS_PARTITION, config.partition_config())
            .map_err(to_cinder_error)?;
        let meta = keyspace
            .open_partition(META_PARTITION, config.partition_config())
            .map_err(to_cinder_error)?;
        log::debug!("Opened fjall keyspace at {}", config.db_path());
        Ok(FjallHandles { keyspace, records, meta })
    }

    pub(crate) fn persist(&self) -> CinderResult<()> {
        self.keyspace.persist(PersistMode::SyncAll).map_err(to_cinder_error)
    }

    fn read_meta<T: serde::de::DeserializeOwned>(&self, key: &str) -> CinderResult<Option<T>> {
        match self.meta.get(key).map_err(to_cinder_error)? {
            Some(bytes) => Ok(Some(decode(&bytes).map_err(to_cinder_error)?)),
            None => Ok(None),
        }
    }
}

/// A secondary index and the partition holding its entries.
#[derive(Clone)]
pub(crate) struct FjallIndex {
    pub(crate) descriptor: IndexDescriptor,
    pub(crate) partition: PartitionHandle,
}

struct FjallStoreInner {
    config: FjallConfig,
    handles: OnceLock<FjallHandles>,
    indexes: RwLock<Vec<FjallIndex>>,
    name: RwLock<Option<String>>,
    version: AtomicU32,
    opened: AtomicBool,
    writer: WriterLock,
    publish: Arc<RwLock<()>>,
}

impl FjallStoreInner {
    fn new(config: FjallConfig) -> Self {
        FjallStoreInner {
            config,
            handles: OnceLock::new(),
            indexes: RwLock::new(Vec::new()),
            name: RwLock::new(None),
            version: AtomicU32::new(0),
            opened: AtomicBool::new(false),
            writer: WriterLock::new(),
            publish: Arc::new(RwLock::new(())),
        }
    }

    fn handles(&self) -> CinderResult<FjallHandles> {
        if let Some(handles) = self.handles.get() {
            return Ok(handles.clone());
        }
        let handles = FjallHandles::open(&self.config)?;
        Ok(self.handles.get_or_init(|| handles).clone())
    }

    fn open_index(&self, handles: &FjallHandles, descriptor: &IndexDescriptor) -> CinderResult<FjallIndex> {
        let name = descriptor.name();
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(to_cinder_error(FjallStoreError::InvalidIndexName(name.to_string())));
        }

        let partition = handles
            .keyspace
            .open_partition(&format!("{}{}", INDEX_PARTITION_PREFIX, name), self.config.partition_config())
            .map_err(to_cinder_error)?;
        Ok(FjallIndex {
            descriptor: descriptor.clone(),
            partition,
        })
    }

    fn backfill(&self, handles: &FjallHandles, index: &FjallIndex, batch: &mut Batch) -> CinderResult<()> {
        for entry in handles.records.iter() {
            let (key, bytes) = entry.map_err(to_cinder_error)?;
            let key = std::str::from_utf8(&key)
                .map_err(|e| to_cinder_error(FjallStoreError::Deserialization(e.to_string())))?;
            let record = decode_record(&bytes).map_err(to_cinder_error)?;
            if let Some(value) = record.get_path(index.descriptor.field()) {
                let entry_key = index_key(value, key).map_err(to_cinder_error)?;
                batch.insert(&index.partition, entry_key, Vec::<u8>::new());
            }
        }
        Ok(())
    }

    fn open(&self, name: &str, version: u32, on_upgrade: UpgradeHook<'_>) -> CinderResult<()> {
        // no write scope may run while the schema changes
        let _writer = self.writer.acquire()?;
        let handles = self.handles()?;

        let stored_name: Option<String> = handles.read_meta(META_NAME)?;
        if let Some(existing) = stored_name.as_deref() {
            if existing != name {
                log::error!("Store is already opened as {}, cannot open as {}", existing, name);
                return Err(CinderError::new(
                    &format!("Store is already opened as {}, cannot open as {}", existing, name),
                    ErrorKind::InvalidOperation,
                ));
            }
        }

        let stored_version: u32 = handles.read_meta(META_VERSION)?.unwrap_or(0);
        let mut descriptors: Vec<IndexDescriptor> = handles.read_meta(META_INDEXES)?.unwrap_or_default();
        let mut indexes = descriptors
            .iter()
            .map(|descriptor| self.open_index(&handles, descriptor))
            .collect::<CinderResult<Vec<_>>>()?;

        let mut batch = handles.keyspace.batch();
        let mut dirty = false;
        let mut effective_version = stored_version;

        if version > stored_version {
            let mut upgrade = SchemaUpgrade::new(stored_version, version, descriptors.clone());
            on_upgrade(&mut upgrade)?;

            for descriptor in upgrade.created_indexes() {
                let index = self.open_index(&handles, descriptor)?;
                self.backfill(&handles, &index, &mut batch)?;
                indexes.push(index);
                descriptors.push(descriptor.clone());
            }

            batch.insert(&handles.meta, META_INDEXES, encode(&descriptors).map_err(to_cinder_error)?);
            batch.insert(&handles.meta, META_VERSION, encode(&version).map_err(to_cinder_error)?);
            effective_version = version;
            dirty = true;
            log::debug!("Fjall store {} upgraded from {} to {}", name, stored_version, version);
        } else {
            log::debug!("Fjall store {} already at version {}", name, stored_version);
        }

        if stored_name.is_none() {
            batch.insert(&handles.meta, META_NAME, encode(name).map_err(to_cinder_error)?);
            dirty = true;
        }

        if dirty {
            batch.commit().map_err(to_cinder_error)?;
            handles.persist()?;
        }

        *self.indexes.write() = indexes;
        *self.name.write() = Some(name.to_string());
        self.version.store(effective_version, Ordering::Release);
        self.opened.store(true, Ordering::Release);
        Ok(())
    }

    fn begin(&self, mode: TransactionMode) -> CinderResult<StoreTransaction> {
        let handles = match (self.opened.load(Ordering::Acquire), self.handles.get()) {
            (true, Some(handles)) => handles.clone(),
            _ => {
                log::error!("Store is not opened");
                return Err(CinderError::new("Store is not opened", ErrorKind::StoreError));
            }
        };

        let tx = match mode {
            TransactionMode::ReadOnly => {
                let reader = self.publish.read_arc();
                FjallTransaction::read_only(handles, self.indexes.read().clone(), reader)
            }
            TransactionMode::ReadWrite => {
                let writer = self.writer.acquire()?;
                FjallTransaction::read_write(
                    handles,
                    self.indexes.read().clone(),
                    self.publish.clone(),
                    writer,
                    self.config.sync_on_commit(),
                )
            }
        };
        Ok(StoreTransaction::new(tx))
    }
}
