use cinder::errors::{CinderError, ErrorKind};
use thiserror::Error;

/// Failures raised inside the Fjall engine adapter.
#[derive(Error, Debug)]
pub enum FjallStoreError {
    /// Error reported by the Fjall keyspace or one of its partitions
    #[error("Fjall engine error: {0}")]
    Engine(#[from] fjall::Error),
    /// A record or metadata value could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(String),
    /// Stored bytes could not be decoded
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    /// Index names become partition names and must be `[a-zA-Z0-9_-]`
    #[error("Invalid index name: {0}")]
    InvalidIndexName(String),
}

impl From<FjallStoreError> for CinderError {
    fn from(err: FjallStoreError) -> Self {
        let kind = match &err {
            FjallStoreError::Engine(_) => ErrorKind::StoreError,
            FjallStoreError::Serialization(_) | FjallStoreError::Deserialization(_) => ErrorKind::EncodingError,
            FjallStoreError::InvalidIndexName(_) => ErrorKind::ValidationError,
        };
        CinderError::new(&err.to_string(), kind)
    }
}

pub type FjallStoreResult<T> = Result<T, FjallStoreError>;

/// Logs `error` and converts it into a [CinderError].
pub(crate) fn to_cinder_error(error: impl Into<FjallStoreError>) -> CinderError {
    let error = error.into();
    log::error!("{}", error);
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_errors_map_to_encoding_kind() {
        let err: CinderError = FjallStoreError::Deserialization("bad bytes".to_string()).into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        assert_eq!(err.message(), "Deserialization failed: bad bytes");

        let err = to_cinder_error(FjallStoreError::Serialization("too deep".to_string()));
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn invalid_index_name_is_a_validation_error() {
        let err: CinderError = FjallStoreError::InvalidIndexName("a b".to_string()).into();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(err.message().contains("a b"));
    }
}
