use std::fmt::{Display, Formatter};

use crate::common::PATH_SEPARATOR;
use crate::errors::{CinderError, CinderResult, ErrorKind};

/// A slash-separated resource path such as `users` or `users/u1/posts/p9`.
///
/// Paths alternate collection and document segments, starting with a
/// collection. An odd segment count names a collection, an even count names
/// a document. Segments are never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parses `path` without checking parity.
    pub fn parse(path: &str) -> CinderResult<ResourcePath> {
        if path.is_empty() {
            log::error!("Path cannot be empty");
            return Err(CinderError::new("Path cannot be empty", ErrorKind::InvalidPath));
        }

        let segments: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            log::error!("Path {} contains an empty segment", path);
            return Err(CinderError::new(
                &format!("Path {} contains an empty segment", path),
                ErrorKind::InvalidPath,
            ));
        }
        Ok(ResourcePath { segments })
    }

    /// Parses a collection path (odd segment count).
    pub fn collection(path: &str) -> CinderResult<ResourcePath> {
        let parsed = Self::parse(path)?;
        if !parsed.is_collection() {
            log::error!("Invalid collection path {}", path);
            return Err(CinderError::new(
                &format!("Invalid collection path {}: expected an odd number of segments", path),
                ErrorKind::InvalidPath,
            ));
        }
        Ok(parsed)
    }

    /// Parses a document path (even segment count).
    pub fn document(path: &str) -> CinderResult<ResourcePath> {
        let parsed = Self::parse(path)?;
        if !parsed.is_document() {
            log::error!("Invalid document path {}", path);
            return Err(CinderError::new(
                &format!("Invalid document path {}: expected an even number of segments", path),
                ErrorKind::InvalidPath,
            ));
        }
        Ok(parsed)
    }

    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment, `None` for a single segment.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(ResourcePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Appends a single segment. `segment` must not contain a separator.
    pub fn child(&self, segment: &str) -> CinderResult<ResourcePath> {
        if segment.is_empty() || segment.contains(PATH_SEPARATOR) {
            log::error!("Invalid path segment {:?}", segment);
            return Err(CinderError::new(
                &format!("Invalid path segment {:?}", segment),
                ErrorKind::InvalidPath,
            ));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(ResourcePath { segments })
    }

    /// Appends every segment of `other`.
    pub fn append(&self, other: &ResourcePath) -> ResourcePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        ResourcePath { segments }
    }

    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
