//! Media store errors.

use std::io;
use std::path::PathBuf;

use stowage_core::paths::PathError;
use thiserror::Error;

/// Errors from file and image store operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The name could not be resolved to a store path.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Filesystem failure at `path`.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Decoding or encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// No file exists for the name.
    #[error("No file at {0}")]
    NotFound(PathBuf),
}

impl MediaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the operation failed because the file does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
