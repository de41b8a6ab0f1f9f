use crate::cinder::Cinder;
use crate::collection::record_ops::{delete_document, set_document, update_document};
use crate::collection::{Document, DocumentReference};
use crate::errors::CinderResult;
use crate::store::TransactionMode;

/// A write queued in a [WriteBatch].
#[derive(Debug, Clone)]
pub enum BatchOperation {
    Set { target: DocumentReference, data: Document },
    Update { target: DocumentReference, data: Document },
    Delete { target: DocumentReference },
}

/// Accumulates writes and commits them atomically.
///
/// ```rust
/// use cinder::cinder::Cinder;
/// use cinder::common::Value;
/// use cinder::doc;
///
/// # fn main() -> cinder::errors::CinderResult<()> {
/// let db = Cinder::builder().open()?;
/// let a = db.doc("users/a")?;
/// let b = db.doc("users/b")?;
///
/// let mut batch = db.batch();
/// batch.set(&a, doc! { n: 1 }).set(&b, doc! { n: 2 }).update(&a, doc! { n: 3 });
/// batch.commit()?;
///
/// assert_eq!(a.get()?.get("n"), Some(Value::from(3)));
/// # Ok(())
/// # }
/// ```
///
/// Operations run in submission order inside one read-write scope. If an
/// `update` targets a missing document the scope is aborted, the commit
/// fails with [ErrorKind::NotFound](crate::errors::ErrorKind::NotFound) and
/// none of the writes are persisted.
pub struct WriteBatch {
    db: Cinder,
    operations: Vec<BatchOperation>,
}

impl WriteBatch {
    pub(crate) fn new(db: Cinder) -> Self {
        WriteBatch {
            db,
            operations: Vec::new(),
        }
    }

    pub fn set(&mut self, target: &DocumentReference, data: Document) -> &mut Self {
        self.operations.push(BatchOperation::Set {
            target: target.clone(),
            data,
        });
        self
    }

    pub fn update(&mut self, target: &DocumentReference, data: Document) -> &mut Self {
        self.operations.push(BatchOperation::Update {
            target: target.clone(),
            data,
        });
        self
    }

    pub fn delete(&mut self, target: &DocumentReference) -> &mut Self {
        self.operations.push(BatchOperation::Delete {
            target: target.clone(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn commit(self) -> CinderResult<()> {
        if self.operations.is_empty() {
            log::debug!("Empty batch committed");
            return Ok(());
        }

        let mut scope = self.db.store().begin(TransactionMode::ReadWrite)?;
        for operation in &self.operations {
            let applied = match operation {
                BatchOperation::Set { target, data } => set_document(&mut scope, target, data),
                BatchOperation::Update { target, data } => update_document(&mut scope, target, data),
                BatchOperation::Delete { target } => delete_document(&mut scope, target),
            };

            if let Err(error) = applied {
                log::error!("Batch of {} operations aborted: {}", self.operations.len(), error);
                if let Err(abort_error) = scope.abort() {
                    log::warn!("Failed to abort batch scope: {}", abort_error);
                }
                return Err(error);
            }
        }

        scope.commit()?;
        log::debug!("Batch of {} operations committed", self.operations.len());
        Ok(())
    }
}
