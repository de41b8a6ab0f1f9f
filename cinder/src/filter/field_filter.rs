use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::filter::WhereOperator;

/// A single `where` predicate over a field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    operator: WhereOperator,
    value: Value,
}

impl FieldFilter {
    pub fn new(field: &str, operator: WhereOperator, value: Value) -> CinderResult<Self> {
        if field.is_empty() {
            log::error!("Filter field name cannot be empty");
            return Err(CinderError::new(
                "Filter field name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        Ok(FieldFilter {
            field: field.to_string(),
            operator,
            value,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> WhereOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn apply(&self, record: &Document) -> bool {
        self.operator.evaluate(record.get_path(&self.field), &self.value)
    }
}

impl Display for FieldFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field, self.operator, self.value)
    }
}
