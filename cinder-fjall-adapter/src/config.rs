use fjall::{Config, PartitionCreateOptions};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Fjall engine configuration.
///
/// Clones share the same settings. Values are read when the keyspace is
/// opened by the first [open](cinder::store::RecordStoreProvider::open)
/// call; later changes have no effect on an opened store.
#[derive(Clone)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl Default for FjallConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FjallConfig {
    /// Creates a configuration with a 64 MB block cache, a 128 MB write
    /// buffer, journal fsync left to the engine and a durable persist on
    /// every commit.
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.db_path())
            .cache_size(self.cache_size())
            .max_write_buffer_size(self.max_write_buffer_size())
            .manual_journal_persist(self.manual_journal_persist())
            .flush_workers(self.flush_workers())
            .compaction_workers(self.compaction_workers());

        if self.fsync_ms() > 0 {
            config = config.fsync_ms(Some(self.fsync_ms()));
        }
        config
    }

    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default()
    }

    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path.get().map(String::as_str).unwrap_or_default()
    }

    /// The path can only be set once.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.db_path.get_or_init(|| db_path.to_string());
    }

    /// Block cache size in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, bytes: u64) {
        self.inner.cache_size.store(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_write_buffer_size(&self, bytes: u64) {
        self.inner.max_write_buffer_size.store(bytes, Ordering::Relaxed);
    }

    /// Background journal fsync interval in milliseconds, `0` to disable.
    #[inline]
    pub fn fsync_ms(&self) -> u16 {
        self.inner.fsync_ms.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_ms(&self, millis: u16) {
        self.inner.fsync_ms.store(millis, Ordering::Relaxed);
    }

    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, manual: bool) {
        self.inner.manual_journal_persist.store(manual, Ordering::Relaxed);
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, count: usize) {
        self.inner.flush_workers.store(count.max(1), Ordering::Relaxed);
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, count: usize) {
        self.inner.compaction_workers.store(count.max(1), Ordering::Relaxed);
    }

    /// Whether every commit waits for the journal to reach disk.
    #[inline]
    pub fn sync_on_commit(&self) -> bool {
        self.inner.sync_on_commit.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_sync_on_commit(&self, sync: bool) {
        self.inner.sync_on_commit.store(sync, Ordering::Relaxed);
    }
}

struct FjallConfigInner {
    db_path: OnceLock<String>,
    cache_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    fsync_ms: AtomicU16,
    manual_journal_persist: AtomicBool,
    flush_workers: AtomicUsize,
    compaction_workers: AtomicUsize,
    sync_on_commit: AtomicBool,
}

impl FjallConfigInner {
    const DEFAULT_CACHE_MB: u64 = 64;
    const DEFAULT_WRITE_BUFFER_MB: u64 = 128;

    fn new() -> FjallConfigInner {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        FjallConfigInner {
            db_path: OnceLock::new(),
            cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
            fsync_ms: AtomicU16::new(0),
            manual_journal_persist: AtomicBool::new(false),
            flush_workers: AtomicUsize::new(cpus.max(1)),
            compaction_workers: AtomicUsize::new((cpus / 2).max(1)),
            sync_on_commit: AtomicBool::new(true),
        }
    }
}
