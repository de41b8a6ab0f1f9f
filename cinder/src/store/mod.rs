//! Storage boundary for Cinder.
//!
//! A [RecordStore] is a key-indexed record engine with secondary indexes
//! and scoped transactions. Every record is a [Document](crate::collection::Document)
//! keyed by the full document path. Engines implement [RecordStoreProvider]
//! and [StoreTransactionProvider]; the in-memory engine lives in [memory],
//! the persistent fjall engine in the `cinder_fjall_adapter` crate.

pub mod memory;
mod record_store;
mod schema;
mod store_transaction;
mod writer_lock;

pub use record_store::*;
pub use schema::*;
pub use store_transaction::*;
pub use writer_lock::*;
