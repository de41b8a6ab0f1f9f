use std::fmt::{Debug, Formatter};
use std::ops::Deref;

use crate::cinder::Cinder;
use crate::collection::record_ops::create_document;
use crate::collection::{Document, DocumentReference, Query};
use crate::common::{generate_auto_id, ResourcePath};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::TransactionMode;

/// Handle to a collection: an unconstrained [Query] over one collection
/// path, plus document creation.
///
/// All query builders are reachable through `Deref`:
///
/// ```rust
/// use cinder::cinder::Cinder;
/// use cinder::doc;
///
/// # fn main() -> cinder::errors::CinderResult<()> {
/// let db = Cinder::builder().open()?;
/// let posts = db.doc("users/u1")?.collection("posts")?;
/// let created = posts.add(doc! { title: "hello" })?;
///
/// assert_eq!(created.collection_path(), "users/u1/posts");
/// assert_eq!(posts.limit(10)?.get()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CollectionReference {
    query: Query,
}

impl CollectionReference {
    pub(crate) fn new(db: Cinder, path: ResourcePath) -> CinderResult<Self> {
        if !path.is_collection() {
            log::error!("Invalid collection path {}", path);
            return Err(CinderError::new(
                &format!("Invalid collection path {}", path),
                ErrorKind::InvalidPath,
            ));
        }
        Ok(Self::from_valid_path(db, path))
    }

    pub(crate) fn from_valid_path(db: Cinder, path: ResourcePath) -> Self {
        CollectionReference {
            query: Query::new(db, path),
        }
    }

    /// Last segment of the collection path.
    pub fn id(&self) -> &str {
        self.query.resource_path().last_segment().unwrap_or_default()
    }

    /// The document owning this collection, `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference> {
        let parent = self.query.resource_path().parent()?;
        DocumentReference::new(self.query.db().clone(), parent).ok()
    }

    /// Reference to the document `id` in this collection.
    pub fn doc(&self, id: &str) -> CinderResult<DocumentReference> {
        let path = self.query.resource_path().child(id)?;
        DocumentReference::new(self.query.db().clone(), path)
    }

    /// Stores `data` under a fresh random id.
    ///
    /// The record is inserted only if its key is new; a collision fails
    /// with [ErrorKind::UniqueConstraintViolation] and never overwrites.
    /// Uniqueness is checked on the full document path only: the same id
    /// may exist under another collection or parent document.
    pub fn add(&self, data: Document) -> CinderResult<DocumentReference> {
        let target = self.doc(&generate_auto_id())?;
        let mut tx = self.query.db().store().begin(TransactionMode::ReadWrite)?;
        create_document(&mut tx, &target, &data)?;
        tx.commit()?;
        Ok(target)
    }
}

impl Deref for CollectionReference {
    type Target = Query;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.query.resource_path() == other.query.resource_path()
    }
}

impl Debug for CollectionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.query.path())
            .finish()
    }
}
