//! In-memory record engine.
//!
//! State is a pair of persistent maps (records and index entries). A
//! read-only scope reads an O(1) clone of the published state; a read-write
//! scope holds the writer lock, edits its own clone and publishes it with a
//! single swap on commit.

mod state;
mod store;
mod transaction;

pub use store::*;
