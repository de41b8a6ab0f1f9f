use crate::error::{FjallStoreError, FjallStoreResult};
use cinder::collection::Document;
use cinder::common::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

const LENGTH_PREFIX: usize = std::mem::size_of::<u32>();

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> FjallStoreResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| FjallStoreError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> FjallStoreResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| FjallStoreError::Deserialization(e.to_string()))
}

pub(crate) fn encode_record(record: &Document) -> FjallStoreResult<Vec<u8>> {
    encode(record)
}

pub(crate) fn decode_record(bytes: &[u8]) -> FjallStoreResult<Document> {
    decode(bytes)
}

/// Rewrites whole floats as integers so that numerically equal values
/// encode to the same index bytes.
fn normalize(value: &Value) -> Value {
    match value {
        Value::F64(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Value::I64(*f as i64)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Document(doc) => Value::Document(
            doc.iter()
                .map(|(key, item)| (key.clone(), normalize(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Prefix shared by every index entry for `value`: the big-endian length
/// of the encoded value followed by the encoded value.
pub(crate) fn index_prefix(value: &Value) -> FjallStoreResult<Vec<u8>> {
    let encoded = encode(&normalize(value))?;
    let length = u32::try_from(encoded.len())
        .map_err(|_| FjallStoreError::Serialization("Indexed value is too large".to_string()))?;

    let mut prefix = Vec::with_capacity(LENGTH_PREFIX + encoded.len());
    prefix.extend_from_slice(&length.to_be_bytes());
    prefix.extend_from_slice(&encoded);
    Ok(prefix)
}

pub(crate) fn index_key(value: &Value, record_key: &str) -> FjallStoreResult<Vec<u8>> {
    let mut key = index_prefix(value)?;
    key.extend_from_slice(record_key.as_bytes());
    Ok(key)
}

/// Extracts the record key from an index entry key.
pub(crate) fn record_key_of(index_key: &[u8]) -> FjallStoreResult<String> {
    let header = index_key
        .get(..LENGTH_PREFIX)
        .ok_or_else(|| FjallStoreError::Deserialization("Truncated index key".to_string()))?;
    let mut length = [0u8; LENGTH_PREFIX];
    length.copy_from_slice(header);
    let start = LENGTH_PREFIX + u32::from_be_bytes(length) as usize;

    let record_key = index_key
        .get(start..)
        .ok_or_else(|| FjallStoreError::Deserialization("Truncated index key".to_string()))?;
    String::from_utf8(record_key.to_vec()).map_err(|e| FjallStoreError::Deserialization(e.to_string()))
}
