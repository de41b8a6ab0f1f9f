use std::time::Duration;

use crate::cinder::Cinder;
use crate::cinder_config::CinderConfig;
use crate::errors::{CinderError, CinderResult};
use crate::store::RecordStoreProvider;

/// Builder for opening a [Cinder] database.
///
/// Configuration errors are captured as they happen; the first one is
/// returned by [open](CinderBuilder::open) and later settings are skipped.
///
/// ```rust
/// use cinder::cinder::Cinder;
/// use cinder::store::memory::InMemoryStore;
/// use std::time::Duration;
///
/// # fn main() -> cinder::errors::CinderResult<()> {
/// let db = Cinder::builder()
///     .name("inventory")
///     .version(2)
///     .poll_interval(Duration::from_millis(50))
///     .load_store(InMemoryStore::new())
///     .open()?;
///
/// assert_eq!(db.version(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct CinderBuilder {
    error: Option<CinderError>,
    config: CinderConfig,
}

impl CinderBuilder {
    pub fn new() -> Self {
        CinderBuilder {
            error: None,
            config: CinderConfig::new(),
        }
    }

    pub fn name(self, name: &str) -> Self {
        self.apply(|config| config.set_name(name))
    }

    /// Schema version to open with. A version above the stored one runs
    /// the schema upgrade once.
    pub fn version(self, version: u32) -> Self {
        self.apply(|config| config.set_schema_version(version))
    }

    pub fn poll_interval(self, interval: Duration) -> Self {
        self.apply(|config| config.set_poll_interval(interval))
    }

    /// Uses `store` instead of the default in-memory engine.
    pub fn load_store<T: RecordStoreProvider + 'static>(self, store: T) -> Self {
        self.apply(|config| config.load_store(store))
    }

    /// Opens the database, returning the first captured configuration error
    /// if there is one.
    pub fn open(self) -> CinderResult<Cinder> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let db = Cinder::new(self.config);
        db.initialize()?;
        Ok(db)
    }

    fn apply(mut self, setting: impl FnOnce(&CinderConfig) -> CinderResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(e) = setting(&self.config) {
                self.error = Some(e);
            }
        }
        self
    }
}
