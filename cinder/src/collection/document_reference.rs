use std::fmt::{Debug, Formatter};

use crate::cinder::Cinder;
use crate::collection::record_ops::{delete_document, read_document, set_document, update_document};
use crate::collection::{CollectionReference, Document, DocumentSnapshot};
use crate::common::ResourcePath;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::TransactionMode;

/// Handle to one document. Holds no record data.
///
/// Every read or write opens its own store scope; group several writes
/// with a [WriteBatch](crate::transaction::WriteBatch) or
/// [Cinder::run_transaction] to make them atomic.
#[derive(Clone)]
pub struct DocumentReference {
    db: Cinder,
    resource_path: ResourcePath,
    parent: ResourcePath,
    path: String,
    id: String,
    collection_path: String,
}

impl DocumentReference {
    pub(crate) fn new(db: Cinder, resource_path: ResourcePath) -> CinderResult<Self> {
        let parent = match resource_path.parent() {
            Some(parent) if resource_path.is_document() => parent,
            _ => {
                log::error!("Invalid document path {}", resource_path);
                return Err(CinderError::new(
                    &format!("Invalid document path {}", resource_path),
                    ErrorKind::InvalidPath,
                ));
            }
        };

        let id = resource_path.last_segment().unwrap_or_default().to_string();
        Ok(DocumentReference {
            db,
            path: resource_path.as_string(),
            collection_path: parent.as_string(),
            resource_path,
            parent,
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full document path, `collectionPath/id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn collection_path(&self) -> &str {
        &self.collection_path
    }

    pub fn parent(&self) -> CollectionReference {
        CollectionReference::from_valid_path(self.db.clone(), self.parent.clone())
    }

    /// A subcollection of this document; `sub_path` may span several
    /// segments but must name a collection.
    pub fn collection(&self, sub_path: &str) -> CinderResult<CollectionReference> {
        let relative = ResourcePath::collection(sub_path)?;
        CollectionReference::new(self.db.clone(), self.resource_path.append(&relative))
    }

    pub fn get(&self) -> CinderResult<DocumentSnapshot> {
        let tx = self.db.store().begin(TransactionMode::ReadOnly)?;
        let snapshot = read_document(&tx, self)?;
        tx.commit()?;
        Ok(snapshot)
    }

    /// Replaces the whole record with `data` plus the reserved fields,
    /// creating it when absent.
    pub fn set(&self, data: Document) -> CinderResult<()> {
        let mut tx = self.db.store().begin(TransactionMode::ReadWrite)?;
        set_document(&mut tx, self, &data)?;
        tx.commit()
    }

    /// Shallow-merges `data` into the existing record.
    ///
    /// Fails with [ErrorKind::NotFound] when the document does not exist.
    pub fn update(&self, data: Document) -> CinderResult<()> {
        let mut tx = self.db.store().begin(TransactionMode::ReadWrite)?;
        update_document(&mut tx, self, &data)?;
        tx.commit()
    }

    /// Removes the document; deleting an absent document succeeds.
    pub fn delete(&self) -> CinderResult<()> {
        let mut tx = self.db.store().begin(TransactionMode::ReadWrite)?;
        delete_document(&mut tx, self)?;
        tx.commit()
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for DocumentReference {}

impl Debug for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReference").field("path", &self.path).finish()
    }
}
