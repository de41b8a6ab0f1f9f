use im::OrdMap;

use crate::common::value::write_json_string;
use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use std::fmt::{Debug, Display, Formatter};

/// An ordered mapping of field names to [Value]s.
///
/// Backed by a persistent `im::OrdMap`, so cloning a document is O(1) and
/// snapshots handed to callers never alias the stored record.
///
/// Field lookups through [Document::get_path] use `.` as the separator for
/// embedded documents: `address.city` reads the `city` field of the
/// document stored under `address`.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Stores `value` under the top-level field `key`, replacing any
    /// previous value.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> CinderResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(CinderError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }
        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Top-level field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Dot-path lookup into embedded documents.
    ///
    /// Returns `None` at the first missing segment, or when a segment other
    /// than the last resolves to something that is not a document.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_document()?.data.get(segment)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Shallow merge: every top-level field of `other` overwrites the
    /// same field of `self`; embedded documents are replaced, not merged.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }

    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    pub(crate) fn write_json(&self, out: &mut String) {
        out.push('{');
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_json_string(key, out);
            out.push(':');
            value.write_json(out);
        }
        out.push('}');
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().filter(|(k, _)| !k.is_empty()).collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = im::ordmap::ConsumingIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a Cinder Document with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use cinder::doc;
///
/// let empty = doc!{};
/// assert!(empty.is_empty());
///
/// let base = 100;
/// let user = doc!{
///     name: "Alice",
///     age: 30,
///     score: (base * 2),
///     address: { city: "Oslo" },
///     tags: ["a", "b"]
/// };
/// assert_eq!(user.get_path("address.city").and_then(|v| v.as_str()), Some("Oslo"));
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn set_up() -> Document {
        doc! {
            name: "Ada",
            age: 36,
            location: {
                city: "London",
                geo: { lat: 51.5 }
            },
            tags: ["math", "engines"],
            "collectionPath": "users"
        }
    }

    #[test]
    fn put_and_get() {
        let mut doc = Document::new();
        doc.put("score", 10).unwrap();
        assert_eq!(doc.get("score"), Some(&Value::I64(10)));
        assert_eq!(doc.len(), 1);
        assert!(!doc.is_empty());
    }

    #[test]
    fn put_rejects_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn get_path_walks_embedded_documents() {
        let doc = set_up();
        assert_eq!(doc.get_path("location.city"), Some(&Value::from("London")));
        assert_eq!(doc.get_path("location.geo.lat"), Some(&Value::F64(51.5)));
        assert_eq!(doc.get_path("age"), Some(&Value::I64(36)));
    }

    #[test]
    fn get_path_stops_at_missing_or_scalar() {
        let doc = set_up();
        assert!(doc.get_path("location.zip").is_none());
        assert!(doc.get_path("age.value").is_none());
        assert!(doc.get_path("tags.0").is_none());
        assert!(doc.get_path("missing").is_none());
    }

    #[test]
    fn macro_normalizes_quoted_keys() {
        let doc = set_up();
        assert_eq!(doc.get("collectionPath"), Some(&Value::from("users")));
    }

    #[test]
    fn merge_is_shallow() {
        let mut doc = set_up();
        doc.merge(&doc! { age: 37, location: { city: "Paris" } });
        assert_eq!(doc.get("age"), Some(&Value::I64(37)));
        assert_eq!(doc.get_path("location.city"), Some(&Value::from("Paris")));
        assert!(doc.get_path("location.geo").is_none());
        assert_eq!(doc.get("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn remove_field() {
        let mut doc = set_up();
        assert_eq!(doc.remove("name"), Some(Value::from("Ada")));
        assert!(!doc.contains_key("name"));
        assert!(doc.remove("name").is_none());
    }

    #[test]
    fn clone_does_not_alias() {
        let original = set_up();
        let mut copy = original.clone();
        copy.put("age", 99).unwrap();
        assert_eq!(original.get("age"), Some(&Value::I64(36)));
    }

    #[test]
    fn to_json_is_key_ordered() {
        let doc = doc! { b: 2, a: "x" };
        assert_eq!(doc.to_json(), r#"{"a":"x","b":2}"#);
    }

    #[test]
    fn structural_equality() {
        assert_eq!(doc! { a: 1, b: [1, 2] }, doc! { b: [1, 2], a: 1 });
        assert_ne!(doc! { a: 1 }, doc! { a: 2 });
        assert_eq!(doc! { a: 1 }, doc! { a: 1.0 });
    }
}
