use crate::collection::Document;
use crate::common::{Value, DOC_ID};

/// Describes where a snapshot's data came from.
///
/// Snapshots are always read from the local store, so `from_cache` is
/// `true` and `has_pending_writes` is `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMetadata {
    from_cache: bool,
    has_pending_writes: bool,
}

impl SnapshotMetadata {
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn has_pending_writes(&self) -> bool {
        self.has_pending_writes
    }
}

impl Default for SnapshotMetadata {
    fn default() -> Self {
        SnapshotMetadata {
            from_cache: true,
            has_pending_writes: false,
        }
    }
}

/// Immutable result of reading one document.
///
/// The snapshot owns a copy of the record taken at read time; later writes
/// to the store never change it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    reference_path: String,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub(crate) fn new(reference_path: String, data: Option<Document>) -> Self {
        DocumentSnapshot {
            reference_path,
            data,
        }
    }

    pub(crate) fn from_record(record: Document) -> Self {
        let reference_path = crate::collection::record_ops::record_path(&record);
        DocumentSnapshot {
            reference_path,
            data: Some(record),
        }
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The stored record, including the `id` and `collectionPath` fields.
    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    /// Reads a (dot-path) field; `None` when the document does not exist
    /// or the path does not resolve.
    pub fn get(&self, field_path: &str) -> Option<Value> {
        self.data.as_ref()?.get_path(field_path).cloned()
    }

    pub fn id(&self) -> Option<&str> {
        self.data.as_ref()?.get(DOC_ID)?.as_str()
    }

    /// Full path of the document this snapshot was read for.
    pub fn reference_path(&self) -> &str {
        &self.reference_path
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata::default()
    }

    /// `true` when both snapshots have the same id and structurally equal
    /// data.
    pub fn is_equal(&self, other: &DocumentSnapshot) -> bool {
        self.id() == other.id() && self.data == other.data
    }
}

/// Ordered result of running a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(docs: Vec<DocumentSnapshot>) -> Self {
        QuerySnapshot { docs }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.docs.iter()
    }

    /// Ids of the documents, in result order.
    pub fn ids(&self) -> Vec<String> {
        self.docs
            .iter()
            .filter_map(|doc| doc.id().map(str::to_string))
            .collect()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}
