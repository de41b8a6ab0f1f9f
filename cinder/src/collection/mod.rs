//! Documents, references, queries and snapshots.
//!
//! Data is organized as collections of documents. A document may own
//! subcollections, so paths alternate collection and document segments:
//! `users`, `users/u1`, `users/u1/posts`, `users/u1/posts/p1`.
//!
//! ```rust
//! use cinder::cinder::Cinder;
//! use cinder::common::SortOrder;
//! use cinder::doc;
//! use cinder::filter::WhereOperator;
//!
//! # fn main() -> cinder::errors::CinderResult<()> {
//! let db = Cinder::builder().open()?;
//! let users = db.collection("users")?;
//!
//! users.doc("alice")?.set(doc! { name: "Alice", age: 34 })?;
//! users.doc("bob")?.set(doc! { name: "Bob", age: 17 })?;
//!
//! let adults = users
//!     .where_field("age", WhereOperator::GreaterThanOrEqual, 18)?
//!     .order_by("name", SortOrder::Ascending)?
//!     .get()?;
//! assert_eq!(adults.len(), 1);
//! assert_eq!(adults.docs()[0].id(), Some("alice"));
//! # Ok(())
//! # }
//! ```
//!
//! References and queries own no record data; every read goes to the
//! store and returns an independent [DocumentSnapshot] or [QuerySnapshot].

mod collection_reference;
mod document;
mod document_reference;
mod document_snapshot;
mod listener;
mod query;
pub(crate) mod record_ops;

pub use collection_reference::*;
pub use document::*;
pub use document_reference::*;
pub use document_snapshot::*;
pub use listener::*;
pub use query::*;
