use std::cell::{Cell, RefCell};

use crate::collection::record_ops::{delete_document, read_document, set_document, update_document};
use crate::collection::{Document, DocumentReference, DocumentSnapshot};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::store::{RecordStore, StoreTransaction, TransactionMode};

/// Represents the state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Transaction is actively receiving operations
    Active,
    /// Successfully committed all changes
    Committed,
    /// Commit failed during execution
    Failed,
    /// Transaction rolled back
    Aborted,
}

/// Reads and writes inside one read-write store scope.
///
/// Obtained through [Cinder::run_transaction](crate::cinder::Cinder::run_transaction).
/// Reads observe the transaction's own earlier writes. The scope holds the
/// store's writer lock until the closure returns, so keep transactions
/// short. Writes issued through references or batches from inside the
/// closure fail with [ErrorKind::InvalidOperation]; route them through the
/// transaction.
pub struct Transaction {
    scope: RefCell<Option<StoreTransaction>>,
    state: Cell<TransactionState>,
}

impl Transaction {
    fn new(scope: StoreTransaction) -> Self {
        Transaction {
            scope: RefCell::new(Some(scope)),
            state: Cell::new(TransactionState::Active),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state.get()
    }

    pub fn get(&self, target: &DocumentReference) -> CinderResult<DocumentSnapshot> {
        self.with_scope(|scope| read_document(scope, target))
    }

    pub fn set(&self, target: &DocumentReference, data: Document) -> CinderResult<()> {
        self.with_scope(|scope| set_document(scope, target, &data))
    }

    /// Shallow-merges `data`; fails with [ErrorKind::NotFound] when the
    /// document does not exist in this transaction's view.
    pub fn update(&self, target: &DocumentReference, data: Document) -> CinderResult<()> {
        self.with_scope(|scope| update_document(scope, target, &data))
    }

    pub fn delete(&self, target: &DocumentReference) -> CinderResult<()> {
        self.with_scope(|scope| delete_document(scope, target))
    }

    /// Discards every write. The enclosing `run_transaction` call fails
    /// with [ErrorKind::Aborted] unless the closure returns its own error.
    pub fn abort(&self) {
        if let Some(scope) = self.scope.borrow_mut().take() {
            if let Err(error) = scope.abort() {
                log::warn!("Failed to abort transaction scope: {}", error);
            }
            self.state.set(TransactionState::Aborted);
            log::debug!("Transaction aborted by caller");
        }
    }

    fn with_scope<R>(&self, op: impl FnOnce(&mut StoreTransaction) -> CinderResult<R>) -> CinderResult<R> {
        match self.scope.borrow_mut().as_mut() {
            Some(scope) => op(scope),
            None => Err(aborted()),
        }
    }

    fn finish<R>(self, outcome: CinderResult<R>) -> CinderResult<R> {
        let scope = self.scope.into_inner();
        match (outcome, scope) {
            (Ok(value), Some(scope)) => match scope.commit() {
                Ok(()) => {
                    self.state.set(TransactionState::Committed);
                    Ok(value)
                }
                Err(error) => {
                    self.state.set(TransactionState::Failed);
                    log::error!("Transaction commit failed: {}", error);
                    Err(error)
                }
            },
            (Ok(_), None) => Err(aborted()),
            (Err(error), Some(scope)) => {
                if let Err(abort_error) = scope.abort() {
                    log::warn!("Failed to abort transaction scope: {}", abort_error);
                }
                log::debug!("Transaction aborted: {}", error);
                Err(error)
            }
            (Err(error), None) => Err(error),
        }
    }
}

fn aborted() -> CinderError {
    log::error!("Transaction aborted");
    CinderError::new("Transaction aborted", ErrorKind::Aborted)
}

/// Runs `f` inside one read-write scope of `store`.
///
/// Commits when `f` returns `Ok`; aborts and returns the closure's error
/// unchanged when it returns `Err`.
pub(crate) fn run_transaction<F, R>(store: &RecordStore, f: F) -> CinderResult<R>
where
    F: FnOnce(&Transaction) -> CinderResult<R>,
{
    let scope = store.begin(TransactionMode::ReadWrite)?;
    let transaction = Transaction::new(scope);
    let outcome = f(&transaction);
    transaction.finish(outcome)
}
