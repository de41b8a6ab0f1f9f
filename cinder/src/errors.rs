use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for Cinder operations
///
/// Each kind describes one category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust
/// use cinder::errors::{CinderError, CinderResult, ErrorKind};
///
/// fn example() -> CinderResult<()> {
///     Err(CinderError::new("Document does not exist for update", ErrorKind::NotFound))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A collection or document path is malformed or has the wrong segment parity
    InvalidPath,
    /// The requested document does not exist
    NotFound,
    /// The storage engine reported a failure
    StoreError,
    /// The enclosing store scope was aborted
    Aborted,
    /// A key that must be new already exists
    UniqueConstraintViolation,
    /// Input failed validation (field names, operators, config values)
    ValidationError,
    /// The operation is not valid in the current state
    InvalidOperation,
    /// Error encoding or decoding a record
    EncodingError,
    /// Generic IO error
    IOError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidPath => write!(f, "Invalid path"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::Aborted => write!(f, "Aborted"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Cinder error type.
///
/// `CinderError` carries a message, a kind, an optional cause and the
/// backtrace of the point where it was created. Backtraces are captured
/// unresolved and symbolized only when the error is debug-printed.
#[derive(Clone)]
pub struct CinderError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<CinderError>>,
    backtrace: Backtrace,
}

impl CinderError {
    /// Creates a new `CinderError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        CinderError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new_unresolved(),
        }
    }

    /// Creates a new `CinderError` that wraps `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: CinderError) -> Self {
        CinderError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new_unresolved(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&CinderError> {
        self.cause.as_deref()
    }
}

impl Display for CinderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for CinderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => {
                let mut backtrace = self.backtrace.clone();
                backtrace.resolve();
                write!(f, "{} ({})\n{:?}", self.message, self.error_kind, backtrace)
            }
        }
    }
}

impl Error for CinderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Cinder operations.
pub type CinderResult<T> = Result<T, CinderError>;

impl From<std::io::Error> for CinderError {
    fn from(err: std::io::Error) -> Self {
        CinderError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::fmt::Error> for CinderError {
    fn from(err: std::fmt::Error) -> Self {
        CinderError::new(&format!("Formatting error: {}", err), ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cinder_error_new_creates_error() {
        let error = CinderError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn cinder_error_new_with_cause_creates_error() {
        let cause = CinderError::new("disk gone", ErrorKind::IOError);
        let error = CinderError::new_with_cause("Commit failed", ErrorKind::StoreError, cause);
        assert_eq!(error.kind(), &ErrorKind::StoreError);
        assert_eq!(error.cause().map(|c| c.message()), Some("disk gone"));
        assert!(error.source().is_some());
    }

    #[test]
    fn cinder_error_display_is_message() {
        let error = CinderError::new("Transaction aborted", ErrorKind::Aborted);
        assert_eq!(format!("{}", error), "Transaction aborted");
    }

    #[test]
    fn cinder_error_debug_contains_kind_and_cause() {
        let cause = CinderError::new("inner", ErrorKind::EncodingError);
        let error = CinderError::new_with_cause("outer", ErrorKind::StoreError, cause);
        let debug = format!("{:?}", error);
        assert!(debug.contains("outer"));
        assert!(debug.contains("Store error"));
        assert!(debug.contains("Caused by: inner"));
    }

    #[test]
    fn cinder_error_clone_keeps_kind() {
        let error = CinderError::new("Document does not exist for update", ErrorKind::NotFound);
        let cloned = error.clone();
        assert_eq!(cloned.kind(), &ErrorKind::NotFound);
        assert_eq!(cloned.message(), error.message());
    }

    #[test]
    fn io_error_converts_to_io_kind() {
        let io = std::io::Error::other("boom");
        let error: CinderError = io.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.message().contains("boom"));
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidPath.to_string(), "Invalid path");
        assert_eq!(ErrorKind::UniqueConstraintViolation.to_string(), "Unique constraint violation");
        assert_eq!(ErrorKind::Aborted.to_string(), "Aborted");
    }
}
