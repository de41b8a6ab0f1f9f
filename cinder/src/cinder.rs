use itertools::Itertools;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::cinder_builder::CinderBuilder;
use crate::cinder_config::CinderConfig;
use crate::collection::{CollectionReference, DocumentReference};
use crate::common::{ResourcePath, COLLECTION_PATH_INDEX, DOC_COLLECTION_PATH};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::{RecordStore, RecordStoreProvider, SchemaUpgrade, TransactionMode};
use crate::transaction::{run_transaction, Transaction, WriteBatch};

/// An opened Cinder database.
///
/// `Cinder` is the entry point for every operation: it hands out collection
/// and document references, write batches and transactions. Clones are
/// cheap and share the same store connection, so a handle can be passed to
/// other threads freely.
///
/// ```rust
/// use cinder::cinder::Cinder;
/// use cinder::doc;
///
/// # fn main() -> cinder::errors::CinderResult<()> {
/// let db = Cinder::builder().open()?;
///
/// let ada = db.doc("users/ada")?;
/// ada.set(doc! { name: "Ada", born: 1815 })?;
///
/// let snapshot = ada.get()?;
/// assert!(snapshot.exists());
/// assert_eq!(db.list_collections()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cinder {
    inner: Arc<CinderInner>,
}

impl Cinder {
    /// Creates a new [CinderBuilder] for configuring and opening a database.
    pub fn builder() -> CinderBuilder {
        CinderBuilder::new()
    }

    /// Opens `store` under `name` with schema `version`.
    pub fn open<T: RecordStoreProvider + 'static>(store: T, name: &str, version: u32) -> CinderResult<Cinder> {
        Cinder::builder().name(name).version(version).load_store(store).open()
    }

    pub(crate) fn new(config: CinderConfig) -> Self {
        Cinder {
            inner: Arc::new(CinderInner::new(config)),
        }
    }

    /// Reference to the collection at `path` (odd segment count).
    pub fn collection(&self, path: &str) -> CinderResult<CollectionReference> {
        let path = ResourcePath::collection(path)?;
        CollectionReference::new(self.clone(), path)
    }

    /// Reference to the document at `path` (even segment count).
    pub fn doc(&self, path: &str) -> CinderResult<DocumentReference> {
        let path = ResourcePath::document(path)?;
        DocumentReference::new(self.clone(), path)
    }

    /// One reference per distinct first segment of every stored collection
    /// path, sorted by name.
    ///
    /// Subcollections are folded into their root collection: a record in
    /// `users/u1/posts` is reported as `users`.
    pub fn list_collections(&self) -> CinderResult<Vec<CollectionReference>> {
        let scope = self.inner.store.begin(TransactionMode::ReadOnly)?;
        let records = scope.get_all()?;
        scope.commit()?;

        records
            .iter()
            .filter_map(|record| {
                record
                    .get(DOC_COLLECTION_PATH)
                    .and_then(|value| value.as_str())
                    .and_then(|path| path.split('/').next())
                    .filter(|root| !root.is_empty())
                    .map(str::to_string)
            })
            .unique()
            .sorted()
            .map(|root| self.collection(&root))
            .collect()
    }

    /// An empty [WriteBatch] bound to this database.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    /// Runs `f` in one read-write scope.
    ///
    /// The scope commits when `f` returns `Ok` and the value is passed
    /// through. When `f` returns `Err` every write is discarded and the
    /// error is returned unchanged. A store failure on commit is returned
    /// as-is.
    ///
    /// ```rust
    /// use cinder::cinder::Cinder;
    /// use cinder::doc;
    ///
    /// # fn main() -> cinder::errors::CinderResult<()> {
    /// let db = Cinder::builder().open()?;
    /// let counter = db.doc("counters/visits")?;
    /// counter.set(doc! { count: 1 })?;
    ///
    /// let next = db.run_transaction(|tx| {
    ///     let current = tx.get(&counter)?.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
    ///     tx.update(&counter, doc! { count: (current + 1) })?;
    ///     Ok(current + 1)
    /// })?;
    /// assert_eq!(next, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn run_transaction<F, R>(&self, f: F) -> CinderResult<R>
    where
        F: FnOnce(&Transaction) -> CinderResult<R>,
    {
        run_transaction(&self.inner.store, f)
    }

    pub fn config(&self) -> CinderConfig {
        self.inner.config.clone()
    }

    pub fn store(&self) -> RecordStore {
        self.inner.store.clone()
    }

    pub fn name(&self) -> String {
        self.inner.config.name()
    }

    /// Schema version stored by the engine after open.
    pub fn version(&self) -> u32 {
        self.inner.store.version()
    }

    pub(crate) fn initialize(&self) -> CinderResult<()> {
        let result = self.inner.initialize();
        if let Err(error) = result {
            log::error!("Failed to open database {}: {}", self.name(), error);
            return Err(CinderError::new_with_cause(
                &format!("Failed to open database {}", self.name()),
                error.kind().clone(),
                error,
            ));
        }
        self.inner.config.freeze();
        Ok(())
    }
}

impl Debug for Cinder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cinder")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}

struct CinderInner {
    config: CinderConfig,
    store: RecordStore,
}

impl CinderInner {
    fn new(config: CinderConfig) -> Self {
        let store = config.store();
        CinderInner { config, store }
    }

    fn initialize(&self) -> CinderResult<()> {
        let name = self.config.name();
        let version = self.config.schema_version();
        self.store.open(&name, version, &mut create_schema)?;

        let indexes = self.store.indexes()?;
        if !indexes.iter().any(|index| index.name() == COLLECTION_PATH_INDEX) {
            log::error!("Store {} has no {} index", name, COLLECTION_PATH_INDEX);
            return Err(CinderError::new(
                &format!("Store {} has no {} index", name, COLLECTION_PATH_INDEX),
                ErrorKind::StoreError,
            ));
        }

        log::debug!("Opened database {} at schema version {}", name, self.store.version());
        Ok(())
    }
}

fn create_schema(upgrade: &mut SchemaUpgrade) -> CinderResult<()> {
    log::debug!(
        "Upgrading schema from version {} to {}",
        upgrade.old_version(),
        upgrade.new_version()
    );
    if !upgrade.has_index(COLLECTION_PATH_INDEX) {
        upgrade.create_index(COLLECTION_PATH_INDEX, DOC_COLLECTION_PATH)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::store::memory::InMemoryStore;

    // Setup only one time throughout the crate tests.
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn collection_and_doc_validate_parity() {
        let db = Cinder::builder().open().unwrap();
        assert!(db.collection("users").is_ok());
        assert!(db.collection("users/u1/posts").is_ok());
        assert_eq!(db.collection("users/u1").unwrap_err().kind(), &ErrorKind::InvalidPath);
        assert_eq!(db.collection("users//posts").unwrap_err().kind(), &ErrorKind::InvalidPath);
        assert_eq!(db.collection("").unwrap_err().kind(), &ErrorKind::InvalidPath);

        assert!(db.doc("users/u1").is_ok());
        assert_eq!(db.doc("users").unwrap_err().kind(), &ErrorKind::InvalidPath);
        assert_eq!(db.doc("users/u1/posts").unwrap_err().kind(), &ErrorKind::InvalidPath);
    }

    #[test]
    fn open_creates_collection_path_index() {
        let store = InMemoryStore::new();
        let db = Cinder::open(store.clone(), "app", 1).unwrap();
        assert_eq!(db.name(), "app");
        assert_eq!(db.version(), 1);
        let indexes = store.indexes().unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name(), COLLECTION_PATH_INDEX);
        assert_eq!(indexes[0].field(), DOC_COLLECTION_PATH);
    }

    #[test]
    fn reopen_keeps_data_and_version() {
        let store = InMemoryStore::new();
        let db = Cinder::open(store.clone(), "app", 2).unwrap();
        db.doc("users/u1").unwrap().set(doc! { a: 1 }).unwrap();

        let lower = Cinder::open(store.clone(), "app", 1).unwrap();
        assert_eq!(lower.version(), 2);
        assert!(lower.doc("users/u1").unwrap().get().unwrap().exists());

        let higher = Cinder::open(store.clone(), "app", 3).unwrap();
        assert_eq!(higher.version(), 3);
        assert_eq!(store.indexes().unwrap().len(), 1);
        assert_eq!(higher.collection("users").unwrap().get().unwrap().len(), 1);
    }

    #[test]
    fn open_under_other_name_fails() {
        let store = InMemoryStore::new();
        Cinder::open(store.clone(), "app", 1).unwrap();
        let err = Cinder::open(store, "other", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert!(err.cause().is_some());
    }

    #[test]
    fn list_collections_groups_by_first_segment() {
        let db = Cinder::builder().open().unwrap();
        assert!(db.list_collections().unwrap().is_empty());

        db.doc("users/u1").unwrap().set(doc! {}).unwrap();
        db.doc("users/u1/posts/p1").unwrap().set(doc! {}).unwrap();
        db.doc("orders/o1").unwrap().set(doc! {}).unwrap();
        db.doc("teams/t1/members/m1").unwrap().set(doc! {}).unwrap();

        let names: Vec<String> = db
            .list_collections()
            .unwrap()
            .iter()
            .map(|c| c.path())
            .collect();
        assert_eq!(names, vec!["orders", "teams", "users"]);
    }

    #[test]
    fn clones_share_the_store() {
        let db = Cinder::builder().open().unwrap();
        let clone = db.clone();
        db.doc("a/b").unwrap().set(doc! { v: 1 }).unwrap();
        assert!(clone.doc("a/b").unwrap().get().unwrap().exists());
    }

    #[test]
    fn handle_is_shared_across_threads() {
        let db = Cinder::builder().open().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let db = db.clone();
                std::thread::spawn(move || {
                    let items = db.collection("items").unwrap();
                    for _ in 0..25 {
                        items.add(doc! { thread: t }).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(db.collection("items").unwrap().get().unwrap().len(), 100);
    }
}
