//! Record-level operations shared by single writes, batches and
//! transactions. Every function runs inside a caller-owned store scope.

use crate::collection::{Document, DocumentReference, DocumentSnapshot};
use crate::common::{Value, DOC_COLLECTION_PATH, DOC_ID, RESERVED_FIELDS};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::StoreTransaction;

/// Full document path of a stored record, rebuilt from its reserved fields.
pub(crate) fn record_path(record: &Document) -> String {
    let collection_path = record.get(DOC_COLLECTION_PATH).and_then(Value::as_str).unwrap_or_default();
    let id = record.get(DOC_ID).and_then(Value::as_str).unwrap_or_default();
    format!("{}/{}", collection_path, id)
}

/// The user payload with reserved fields dropped.
fn user_fields(data: &Document) -> Document {
    data.iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// `data` plus the target's own `id` and `collectionPath`.
pub(crate) fn build_record(target: &DocumentReference, data: &Document) -> Document {
    user_fields(data)
        .into_iter()
        .chain([
            (DOC_ID.to_string(), Value::from(target.id())),
            (DOC_COLLECTION_PATH.to_string(), Value::from(target.collection_path())),
        ])
        .collect()
}

fn belongs_to(record: &Document, target: &DocumentReference) -> bool {
    record.get(DOC_ID).and_then(Value::as_str) == Some(target.id())
        && record.get(DOC_COLLECTION_PATH).and_then(Value::as_str) == Some(target.collection_path())
}

fn find_record(tx: &StoreTransaction, target: &DocumentReference) -> CinderResult<Option<Document>> {
    Ok(tx.get(target.path())?.filter(|record| belongs_to(record, target)))
}

pub(crate) fn read_document(tx: &StoreTransaction, target: &DocumentReference) -> CinderResult<DocumentSnapshot> {
    let record = find_record(tx, target)?;
    Ok(DocumentSnapshot::new(target.path().to_string(), record))
}

pub(crate) fn set_document(tx: &mut StoreTransaction, target: &DocumentReference, data: &Document) -> CinderResult<()> {
    tx.put(target.path(), build_record(target, data))
}

pub(crate) fn create_document(tx: &mut StoreTransaction, target: &DocumentReference, data: &Document) -> CinderResult<()> {
    tx.insert(target.path(), build_record(target, data))
}

pub(crate) fn update_document(tx: &mut StoreTransaction, target: &DocumentReference, data: &Document) -> CinderResult<()> {
    match find_record(tx, target)? {
        Some(mut record) => {
            record.merge(&user_fields(data));
            tx.put(target.path(), record)
        }
        None => {
            log::error!("Document {} does not exist for update", target.path());
            Err(CinderError::new(
                &format!("Document does not exist for update: {}", target.path()),
                ErrorKind::NotFound,
            ))
        }
    }
}

pub(crate) fn delete_document(tx: &mut StoreTransaction, target: &DocumentReference) -> CinderResult<()> {
    tx.delete(target.path())
}
