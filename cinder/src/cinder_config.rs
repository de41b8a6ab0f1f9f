//! Configuration management for a Cinder database.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::common::{DEFAULT_DATABASE_NAME, DEFAULT_POLL_INTERVAL_MILLIS, INITIAL_SCHEMA_VERSION};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::memory::InMemoryStore;
use crate::store::{RecordStore, RecordStoreProvider};

/// Settings of one database handle.
///
/// Every setting is frozen once the database is opened; later changes fail
/// with [ErrorKind::InvalidOperation]. Clones share the same settings.
#[derive(Clone)]
pub struct CinderConfig {
    inner: Arc<CinderConfigInner>,
}

impl Default for CinderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CinderConfig {
    /// Creates a configuration with the default name, schema version 1,
    /// a 100 ms poll interval and an in-memory store.
    pub fn new() -> Self {
        CinderConfig {
            inner: Arc::new(CinderConfigInner::new()),
        }
    }

    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    /// Sets the database name passed to the store on open.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if the name is empty.
    pub fn set_name(&self, name: &str) -> CinderResult<()> {
        self.inner.check_not_configured("Database name")?;
        if name.is_empty() {
            log::error!("Database name cannot be empty");
            return Err(CinderError::new(
                "Database name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        *self.inner.name.write() = name.to_string();
        Ok(())
    }

    pub fn schema_version(&self) -> u32 {
        self.inner.schema_version.load(Ordering::Relaxed)
    }

    /// Sets the schema version requested on open.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if `version` is zero.
    pub fn set_schema_version(&self, version: u32) -> CinderResult<()> {
        self.inner.check_not_configured("Schema version")?;
        if version < INITIAL_SCHEMA_VERSION {
            log::error!("Schema version must be at least {}, got {}", INITIAL_SCHEMA_VERSION, version);
            return Err(CinderError::new(
                &format!("Schema version must be at least {}, got {}", INITIAL_SCHEMA_VERSION, version),
                ErrorKind::ValidationError,
            ));
        }
        self.inner.schema_version.store(version, Ordering::Relaxed);
        Ok(())
    }

    /// Interval between two polls of a snapshot listener.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.inner.poll_interval_millis.load(Ordering::Relaxed))
    }

    /// # Errors
    ///
    /// Returns error if already configured or if the interval rounds down
    /// to zero milliseconds.
    pub fn set_poll_interval(&self, interval: Duration) -> CinderResult<()> {
        self.inner.check_not_configured("Poll interval")?;
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            log::error!("Poll interval must be at least one millisecond");
            return Err(CinderError::new(
                "Poll interval must be at least one millisecond",
                ErrorKind::ValidationError,
            ));
        }
        self.inner.poll_interval_millis.store(millis, Ordering::Relaxed);
        Ok(())
    }

    /// Installs the record engine. Only one engine can be loaded.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if an engine is already set.
    pub fn load_store<T: RecordStoreProvider + 'static>(&self, store: T) -> CinderResult<()> {
        self.inner.check_not_configured("Store")?;
        if self.inner.store.set(RecordStore::new(store)).is_err() {
            log::error!("A store has already been loaded");
            return Err(CinderError::new(
                "A store has already been loaded",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    /// The loaded engine, the in-memory engine when none was loaded.
    pub fn store(&self) -> RecordStore {
        self.inner
            .store
            .get_or_init(|| RecordStore::new(InMemoryStore::new()))
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    pub(crate) fn freeze(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

struct CinderConfigInner {
    configured: AtomicBool,
    name: RwLock<String>,
    schema_version: AtomicU32,
    poll_interval_millis: AtomicU64,
    store: OnceLock<RecordStore>,
}

impl CinderConfigInner {
    fn new() -> Self {
        CinderConfigInner {
            configured: AtomicBool::from(false),
            name: RwLock::new(DEFAULT_DATABASE_NAME.to_string()),
            schema_version: AtomicU32::from(INITIAL_SCHEMA_VERSION),
            poll_interval_millis: AtomicU64::from(DEFAULT_POLL_INTERVAL_MILLIS),
            store: OnceLock::new(),
        }
    }

    fn check_not_configured(&self, setting: &str) -> CinderResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", setting);
            return Err(CinderError::new(
                &format!("{} cannot be changed after initialization", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CinderConfig::new();
        assert_eq!(config.name(), "CinderDB");
        assert_eq!(config.schema_version(), 1);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(!config.is_configured());
        assert!(!config.store().is_opened());
    }

    #[test]
    fn setters_validate() {
        let config = CinderConfig::new();
        assert_eq!(config.set_name("").unwrap_err().kind(), &ErrorKind::ValidationError);
        assert_eq!(config.set_schema_version(0).unwrap_err().kind(), &ErrorKind::ValidationError);
        assert_eq!(
            config.set_poll_interval(Duration::from_micros(10)).unwrap_err().kind(),
            &ErrorKind::ValidationError
        );

        config.set_name("shop").unwrap();
        config.set_schema_version(4).unwrap();
        config.set_poll_interval(Duration::from_millis(250)).unwrap();
        assert_eq!(config.name(), "shop");
        assert_eq!(config.schema_version(), 4);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn settings_are_frozen_after_configuration() {
        let config = CinderConfig::new();
        config.freeze();
        assert!(config.is_configured());
        assert_eq!(config.set_name("x").unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(config.set_schema_version(2).unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(
            config.load_store(InMemoryStore::new()).unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
    }

    #[test]
    fn store_can_be_loaded_once() {
        let config = CinderConfig::new();
        config.load_store(InMemoryStore::new()).unwrap();
        assert_eq!(
            config.load_store(InMemoryStore::new()).unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
    }

    #[test]
    fn clones_share_settings() {
        let config = CinderConfig::new();
        let clone = config.clone();
        config.set_schema_version(3).unwrap();
        assert_eq!(clone.schema_version(), 3);
    }
}
