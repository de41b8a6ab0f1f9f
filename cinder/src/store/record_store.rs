use crate::errors::CinderResult;
use crate::store::{IndexDescriptor, SchemaUpgrade, StoreTransaction, TransactionMode};
use std::ops::Deref;
use std::sync::Arc;

/// Callback run once when a store is opened with a newer schema version.
pub type UpgradeHook<'a> = &'a mut dyn FnMut(&mut SchemaUpgrade) -> CinderResult<()>;

/// A key-indexed record engine.
///
/// Engines are opened once per database name. Opening with a version
/// lower than or equal to the stored one leaves the schema untouched;
/// opening with a higher version runs `on_upgrade` exactly once, builds
/// the indexes it requested and records the new version.
pub trait RecordStoreProvider: Send + Sync {
    fn open(&self, name: &str, version: u32, on_upgrade: UpgradeHook<'_>) -> CinderResult<()>;

    fn is_opened(&self) -> bool;

    /// Database name the engine was opened with.
    fn name(&self) -> Option<String>;

    /// Stored schema version, `0` before the first open.
    fn version(&self) -> u32;

    fn indexes(&self) -> CinderResult<Vec<IndexDescriptor>>;

    fn begin(&self, mode: TransactionMode) -> CinderResult<StoreTransaction>;
}

/// Shared handle over a [RecordStoreProvider].
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<dyn RecordStoreProvider>,
}

impl RecordStore {
    pub fn new<T: RecordStoreProvider + 'static>(inner: T) -> Self {
        RecordStore { inner: Arc::new(inner) }
    }
}

impl Deref for RecordStore {
    type Target = Arc<dyn RecordStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
