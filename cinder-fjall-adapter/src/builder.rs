use crate::config::FjallConfig;
use crate::store::FjallStore;
use cinder::errors::{CinderError, CinderResult, ErrorKind};

/// Fluent configuration of a [FjallStore].
///
/// ```rust,ignore
/// use cinder::cinder::Cinder;
/// use cinder_fjall_adapter::FjallStore;
///
/// let store = FjallStore::with_config()
///     .db_path("/var/lib/app/db")
///     .cache_size(32 * 1024 * 1024)
///     .build()?;
/// let db = Cinder::open(store, "app", 1)?;
/// ```
pub struct FjallStoreBuilder {
    config: FjallConfig,
    path_set: bool,
}

impl FjallStoreBuilder {
    #[inline]
    pub fn new() -> FjallStoreBuilder {
        FjallStoreBuilder {
            config: FjallConfig::new(),
            path_set: false,
        }
    }

    /// Directory holding the keyspace. Required.
    pub fn db_path(mut self, path: &str) -> Self {
        self.config.set_db_path(path);
        self.path_set = !path.is_empty();
        self
    }

    /// Small caches and a single flush and compaction worker, for tests and
    /// constrained hosts.
    pub fn low_memory_preset(self) -> Self {
        self.cache_size(8 * 1024 * 1024)
            .max_write_buffer_size(16 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
    }

    /// Block cache size in bytes.
    pub fn cache_size(self, bytes: u64) -> Self {
        self.config.set_cache_size(bytes);
        self
    }

    pub fn max_write_buffer_size(self, bytes: u64) -> Self {
        self.config.set_max_write_buffer_size(bytes);
        self
    }

    pub fn flush_workers(self, count: usize) -> Self {
        self.config.set_flush_workers(count);
        self
    }

    pub fn compaction_workers(self, count: usize) -> Self {
        self.config.set_compaction_workers(count);
        self
    }

    /// Background journal fsync interval, `0` leaves it to the engine.
    pub fn fsync_ms(self, millis: u16) -> Self {
        self.config.set_fsync_ms(millis);
        self
    }

    pub fn manual_journal_persist(self, manual: bool) -> Self {
        self.config.set_manual_journal_persist(manual);
        self
    }

    /// When `false`, commits return once the batch is applied without
    /// waiting for the journal to reach disk.
    pub fn sync_on_commit(self, sync: bool) -> Self {
        self.config.set_sync_on_commit(sync);
        self
    }

    /// Fails with [ErrorKind::ValidationError] when no path was given.
    pub fn build(self) -> CinderResult<FjallStore> {
        if !self.path_set {
            log::error!("Fjall store requires a database path");
            return Err(CinderError::new(
                "Fjall store requires a database path",
                ErrorKind::ValidationError,
            ));
        }
        Ok(FjallStore::new(self.config))
    }
}

impl Default for FjallStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_a_path() {
        let err = FjallStoreBuilder::new().build().err().map(|e| e.kind().clone());
        assert_eq!(err, Some(ErrorKind::ValidationError));

        let err = FjallStoreBuilder::new().db_path("").build().err().map(|e| e.kind().clone());
        assert_eq!(err, Some(ErrorKind::ValidationError));
    }

    #[test]
    fn settings_reach_the_config() {
        let store = FjallStoreBuilder::new()
            .db_path("/tmp/cinder-builder-test")
            .cache_size(1_024)
            .fsync_ms(20)
            .sync_on_commit(false)
            .build()
            .unwrap();
        let config = store.config();
        assert_eq!(config.db_path(), "/tmp/cinder-builder-test");
        assert_eq!(config.cache_size(), 1_024);
        assert_eq!(config.fsync_ms(), 20);
        assert!(!config.sync_on_commit());
    }

    #[test]
    fn low_memory_preset_uses_single_workers() {
        let store = FjallStoreBuilder::new()
            .db_path("/tmp/cinder-preset-test")
            .low_memory_preset()
            .build()
            .unwrap();
        assert_eq!(store.config().flush_workers(), 1);
        assert_eq!(store.config().compaction_workers(), 1);
        assert_eq!(store.config().cache_size(), 8 * 1024 * 1024);
    }
}
