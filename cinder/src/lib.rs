//! # Cinder - Embedded Hierarchical Document Database
//!
//! Cinder stores JSON-like documents in nested collections addressed by
//! slash-separated paths (`users/u1/posts/p9`). It runs in-process on top of
//! a pluggable key-indexed record engine.
//!
//! ## Key Features
//!
//! - **Hierarchical paths**: collections contain documents, documents own subcollections
//! - **Queries**: equality, range and `array-contains` filters, ordering, limits and cursors
//! - **Write batches**: several writes committed atomically in one store scope
//! - **Transactions**: closure-based read-write transactions with rollback on error
//! - **Snapshot listeners**: interval polling that fires once per distinct result
//! - **Pluggable engines**: an in-memory engine here, a persistent one in `cinder-fjall-adapter`
//!
//! ## Quick Start
//!
//! ```rust
//! use cinder::cinder::Cinder;
//! use cinder::common::{SortOrder, Value};
//! use cinder::doc;
//! use cinder::filter::WhereOperator;
//!
//! # fn main() -> cinder::errors::CinderResult<()> {
//! let db = Cinder::builder().name("people").open()?;
//! let users = db.collection("users")?;
//!
//! users.doc("ada")?.set(doc! { name: "Ada", age: 36 })?;
//! users.doc("alan")?.set(doc! { name: "Alan", age: 41 })?;
//! users.doc("kid")?.set(doc! { name: "Kid", age: 9 })?;
//!
//! let adults = users
//!     .where_field("age", WhereOperator::GreaterThanOrEqual, 18)?
//!     .order_by("age", SortOrder::Descending)?
//!     .get()?;
//!
//! assert_eq!(adults.len(), 2);
//! assert_eq!(adults.docs()[0].get("name"), Some(Value::from("Alan")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cinder`] - Root database handle
//! - [`cinder_builder`] - Builder for opening a database
//! - [`cinder_config`] - Database configuration
//! - [`collection`] - Documents, references, queries, snapshots and listeners
//! - [`common`] - Values, paths, constants and utilities
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Field filters and where operators
//! - [`store`] - Record engine abstractions and the in-memory engine
//! - [`transaction`] - Write batches and transactions

use crate::common::Scheduler;
use std::sync::LazyLock;

pub mod cinder;
pub mod cinder_builder;
pub mod cinder_config;
pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod store;
pub mod transaction;

pub(crate) static SCHEDULER: LazyLock<Scheduler> = LazyLock::new(Scheduler::new);
