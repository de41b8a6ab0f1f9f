//! Field predicates for queries.
//!
//! A [FieldFilter] pairs a (dot-path) field with a [WhereOperator] and an
//! operand. Filters are created with [Query::where_field](crate::collection::Query::where_field)
//! or through the fluent API:
//!
//! ```rust
//! use cinder::doc;
//! use cinder::filter::field;
//!
//! let adult = field("age").gte(18);
//! assert!(adult.apply(&doc! { age: 30 }));
//! assert!(!adult.apply(&doc! { age: "30" }));
//! assert!(!adult.apply(&doc! { name: "no age" }));
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `==`, `!=` (structural equality)
//! - **Comparison**: `>`, `>=`, `<`, `<=` (same comparable class only)
//! - **Array**: `array-contains`

mod field_filter;
mod fluent;
mod where_operator;

pub use field_filter::*;
pub use fluent::*;
pub use where_operator::*;
