//! Pure mapping from logical file names to absolute store paths.
//!
//! The resolver holds no state beyond its root and segments. The same input
//! always produces the same path, and nothing touches the filesystem.

use std::path::{Path, PathBuf};

use super::error::PathError;

/// Maps (root, segments, file name) to an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResolver {
    root: PathBuf,
    segments: Vec<String>,
}

impl StorageResolver {
    /// Create a resolver placing files directly under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// Append one path segment.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append several path segments.
    #[must_use]
    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Segments between the root and resolved files.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Directory resolved files are placed in.
    pub fn directory(&self) -> PathBuf {
        self.segments
            .iter()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Resolve a file name under the configured segments.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, PathError> {
        self.resolve_in(&[], file_name)
    }

    /// Resolve a file name under the configured segments plus `extra`.
    pub fn resolve_in(&self, extra: &[&str], file_name: &str) -> Result<PathBuf, PathError> {
        let name = validate_file_name(file_name)?;
        let mut path = self.directory();
        for segment in extra {
            path.push(validate_file_name(segment)?);
        }
        path.push(name);
        Ok(path)
    }
}

/// Check that `name` is a single, plain path component.
///
/// Rejects empty names, `.`/`..`, separators and NUL bytes.
pub fn validate_file_name(name: &str) -> Result<&str, PathError> {
    if name.trim().is_empty() {
        return Err(PathError::EmptyFileName);
    }

    let reject = |reason: &str| {
        Err(PathError::InvalidFileName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name == "." || name == ".." {
        return reject("refers to a directory");
    }
    if name.contains(['/', '\\']) {
        return reject("contains a path separator");
    }
    if name.contains('\0') {
        return reject("contains a NUL byte");
    }

    Ok(name)
}
