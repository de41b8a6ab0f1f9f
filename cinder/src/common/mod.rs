//! Common types shared across Cinder: field values, resource paths, sort
//! directions and the background task scheduler.

mod constants;
mod path;
mod sort_order;
pub mod util;
pub mod value;

pub use constants::*;
pub use path::*;
pub use sort_order::*;
pub use util::*;
pub use value::{Value, ValueClass};
