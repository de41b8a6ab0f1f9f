//! Atomic multi-document writes.
//!
//! - [WriteBatch] collects blind writes and applies them in one store scope.
//! - [Transaction] is handed to the closure of
//!   [Cinder::run_transaction](crate::cinder::Cinder::run_transaction) and
//!   mixes reads and writes inside one read-write scope.
//!
//! In both cases either every write is committed or none is.

mod transaction;
mod write_batch;

pub use transaction::*;
pub use write_batch::*;
