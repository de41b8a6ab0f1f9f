use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::common::Value;
use crate::errors::{CinderError, ErrorKind};

/// Comparison operator of a `where` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhereOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    ArrayContains,
}

impl WhereOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereOperator::Equal => "==",
            WhereOperator::NotEqual => "!=",
            WhereOperator::GreaterThan => ">",
            WhereOperator::GreaterThanOrEqual => ">=",
            WhereOperator::LessThan => "<",
            WhereOperator::LessThanOrEqual => "<=",
            WhereOperator::ArrayContains => "array-contains",
        }
    }

    /// Evaluates the operator against a field value, `None` when the field
    /// is missing. A missing field fails every operator except `!=`.
    pub fn evaluate(&self, field_value: Option<&Value>, operand: &Value) -> bool {
        let value = match field_value {
            Some(value) => value,
            None => return *self == WhereOperator::NotEqual,
        };

        match self {
            WhereOperator::Equal => value == operand,
            WhereOperator::NotEqual => value != operand,
            WhereOperator::GreaterThan => compare(value, operand) == Some(Ordering::Greater),
            WhereOperator::GreaterThanOrEqual => {
                matches!(compare(value, operand), Some(Ordering::Greater | Ordering::Equal))
            }
            WhereOperator::LessThan => compare(value, operand) == Some(Ordering::Less),
            WhereOperator::LessThanOrEqual => {
                matches!(compare(value, operand), Some(Ordering::Less | Ordering::Equal))
            }
            WhereOperator::ArrayContains => value
                .as_array()
                .is_some_and(|items| items.iter().any(|item| item == operand)),
        }
    }
}

#[inline]
fn compare(value: &Value, operand: &Value) -> Option<Ordering> {
    if value.is_comparable_with(operand) {
        Some(value.cmp(operand))
    } else {
        None
    }
}

impl Display for WhereOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WhereOperator {
    type Err = CinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(WhereOperator::Equal),
            "!=" => Ok(WhereOperator::NotEqual),
            ">" => Ok(WhereOperator::GreaterThan),
            ">=" => Ok(WhereOperator::GreaterThanOrEqual),
            "<" => Ok(WhereOperator::LessThan),
            "<=" => Ok(WhereOperator::LessThanOrEqual),
            "array-contains" => Ok(WhereOperator::ArrayContains),
            other => {
                log::error!("Unknown where operator {}", other);
                Err(CinderError::new(
                    &format!("Unknown where operator {}", other),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}
