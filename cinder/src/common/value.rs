use crate::collection::Document;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

/// Compare two floats with NaN treated as greater than every other number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer with a float exactly, without rounding the integer.
fn num_cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63; every i64 is below it and at or above its negation
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= BOUND {
        return Ordering::Less;
    }
    if f < -BOUND {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => num_cmp_float(0.0, f - whole),
        ordering => ordering,
    }
}

/// Represents a [Document] field value.
///
/// Integers and floats form a single number class: `I64(1)` equals
/// `F64(1.0)` and the two compare by exact numeric value. Values of
/// different classes are ordered `Null < Bool < number < String < Array < Document`.
#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Array(Vec<Value>),
    Document(Document),
}

/// Ordering rank of a value's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueClass {
    Null,
    Bool,
    Number,
    String,
    Array,
    Document,
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::I64(a), Value::F64(b)) => num_cmp_int_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => num_cmp_int_float(*b, *a).reverse(),
            (Value::F64(a), Value::F64(b)) => num_cmp_float(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            _ => self.class().cmp(&other.class()),
        }
    }
}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            // whole floats hash like the equal integer
            Value::F64(v) if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 => {
                (*v as i64).hash(state)
            }
            Value::F64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::Document(v) => v.hash(state),
        }
    }
}

impl Value {
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(Into::into).collect())
    }

    pub fn class(&self) -> ValueClass {
        match self {
            Value::Null => ValueClass::Null,
            Value::Bool(_) => ValueClass::Bool,
            Value::I64(_) | Value::F64(_) => ValueClass::Number,
            Value::String(_) => ValueClass::String,
            Value::Array(_) => ValueClass::Array,
            Value::Document(_) => ValueClass::Document,
        }
    }

    /// Whether `<`, `<=`, `>` and `>=` are meaningful between the two values.
    ///
    /// Only numbers, strings and booleans are ordered, and only against a
    /// value of the same class.
    pub fn is_comparable_with(&self, other: &Value) -> bool {
        matches!(
            (self.class(), other.class()),
            (ValueClass::Number, ValueClass::Number)
                | (ValueClass::String, ValueClass::String)
                | (ValueClass::Bool, ValueClass::Bool)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    /// Compact JSON rendering, used for display and logging.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    pub(crate) fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(&v.to_string()),
            Value::I64(v) => out.push_str(&v.to_string()),
            Value::F64(v) if v.is_finite() => out.push_str(&v.to_string()),
            Value::F64(_) => out.push_str("null"),
            Value::String(v) => write_json_string(v, out),
            Value::Array(values) => {
                out.push('[');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    value.write_json(out);
                }
                out.push(']');
            }
            Value::Document(doc) => doc.write_json(out),
        }
    }
}

pub(crate) fn write_json_string(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::I64(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(v) => Value::I64(v),
            Err(_) => Value::F64(value as f64),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::from_vec(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn integers_and_floats_are_one_number_class() {
        assert_eq!(Value::I64(1), Value::F64(1.0));
        assert!(Value::I64(1) < Value::F64(1.5));
        assert!(Value::F64(-0.5) < Value::I64(0));
        assert_eq!(hash_of(&Value::I64(42)), hash_of(&Value::F64(42.0)));
    }

    #[test]
    fn cross_class_order() {
        let mut values = vec![
            Value::Document(doc! { a: 1 }),
            Value::from("b"),
            Value::Array(vec![]),
            Value::I64(3),
            Value::Bool(true),
            Value::Null,
        ];
        values.sort();
        let classes: Vec<ValueClass> = values.iter().map(|v| v.class()).collect();
        assert_eq!(
            classes,
            vec![
                ValueClass::Null,
                ValueClass::Bool,
                ValueClass::Number,
                ValueClass::String,
                ValueClass::Array,
                ValueClass::Document,
            ]
        );
    }

    #[test]
    fn nan_sorts_after_numbers() {
        assert!(Value::F64(f64::NAN) > Value::I64(i64::MAX));
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
    }

    #[test]
    fn comparable_classes() {
        assert!(Value::I64(1).is_comparable_with(&Value::F64(2.0)));
        assert!(Value::from("a").is_comparable_with(&Value::from("b")));
        assert!(Value::Bool(false).is_comparable_with(&Value::Bool(true)));
        assert!(!Value::from("1").is_comparable_with(&Value::I64(1)));
        assert!(!Value::Null.is_comparable_with(&Value::Null));
        assert!(!Value::Array(vec![]).is_comparable_with(&Value::Array(vec![])));
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(7i32), Value::I64(7));
        assert_eq!(Value::from(Some("x")), Value::from("x"));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(vec![1, 2]), Value::Array(vec![Value::I64(1), Value::I64(2)]));
        assert_eq!(Value::from(2.5f64).as_f64(), Some(2.5));
        assert_eq!(Value::I64(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert!(Value::default().is_null());
    }

    #[test]
    fn json_rendering() {
        let value = Value::from(vec![Value::from("a\"b"), Value::Null, Value::Bool(true), Value::F64(1.5)]);
        assert_eq!(value.to_json(), r#"["a\"b",null,true,1.5]"#);
        assert_eq!(Value::F64(f64::INFINITY).to_json(), "null");
    }

    #[test]
    fn large_integers_compare_exactly_with_floats() {
        let big = 1i64 << 53;
        let float = Value::F64(big as f64);

        assert_eq!(Value::I64(big), float);
        assert!(Value::I64(big + 1) > float);
        assert!(float < Value::I64(big + 1));
        assert_ne!(Value::I64(big + 1), float);

        // transitive through the float
        assert!(Value::I64(big) < Value::I64(big + 1));
        assert!(Value::I64(big) <= float && float < Value::I64(big + 1));

        assert!(Value::I64(i64::MAX) < Value::F64(9_223_372_036_854_775_808.0));
        assert_eq!(Value::I64(i64::MIN), Value::F64(-9_223_372_036_854_775_808.0));
        assert!(Value::I64(-3) > Value::F64(-3.5));
        assert!(Value::I64(-3) < Value::F64(-2.5));
        assert!(Value::I64(i64::MAX) < Value::F64(f64::INFINITY));
        assert!(Value::I64(i64::MIN) > Value::F64(f64::NEG_INFINITY));
        assert!(Value::I64(i64::MAX) < Value::F64(f64::NAN));
    }

    #[test]
    fn equal_numbers_hash_alike_and_unequal_ones_stay_distinct() {
        let big = 1i64 << 53;
        assert_eq!(hash_of(&Value::I64(big)), hash_of(&Value::F64(big as f64)));

        let mut set = std::collections::HashSet::new();
        set.insert(Value::I64(big));
        set.insert(Value::I64(big + 1));
        set.insert(Value::F64(big as f64));
        assert_eq!(set.len(), 2);
    }
}

