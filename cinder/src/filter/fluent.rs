use crate::collection::Document;
use crate::common::Value;
use crate::errors::CinderResult;
use crate::filter::{FieldFilter, WhereOperator};

/// Starts a fluent filter on `name`.
///
/// Field names are validated when the filter is added to a query, so an
/// empty name surfaces there as a validation error.
pub fn field(name: &str) -> FluentFilter {
    FluentFilter {
        field: name.to_string(),
    }
}

pub struct FluentFilter {
    field: String,
}

impl FluentFilter {
    pub fn eq<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::Equal, value)
    }

    pub fn ne<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::NotEqual, value)
    }

    pub fn gt<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::GreaterThan, value)
    }

    pub fn gte<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::GreaterThanOrEqual, value)
    }

    pub fn lt<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::LessThan, value)
    }

    pub fn lte<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::LessThanOrEqual, value)
    }

    pub fn array_contains<T: Into<Value>>(self, value: T) -> FieldPredicate {
        self.with(WhereOperator::ArrayContains, value)
    }

    fn with<T: Into<Value>>(self, operator: WhereOperator, value: T) -> FieldPredicate {
        FieldPredicate {
            field: self.field,
            operator,
            value: value.into(),
        }
    }
}

/// An unvalidated filter produced by the fluent API.
#[derive(Debug, Clone)]
pub struct FieldPredicate {
    field: String,
    operator: WhereOperator,
    value: Value,
}

impl FieldPredicate {
    pub fn apply(&self, record: &Document) -> bool {
        self.operator.evaluate(record.get_path(&self.field), &self.value)
    }

    pub fn build(self) -> CinderResult<FieldFilter> {
        FieldFilter::new(&self.field, self.operator, self.value)
    }
}
