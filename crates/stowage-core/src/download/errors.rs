//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error`. For I/O errors, we capture the kind
//! and message as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
///
/// Per-task failures travel inside the completion event; only malformed calls
/// are returned synchronously from coordinator operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The source URL could not be parsed.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The destination name is empty or not a plain file name.
    #[error("Invalid file name '{name}': {message}")]
    InvalidFileName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// Network or server error reported by the transport.
    #[error("Transfer failed: {message}")]
    TransferFailed {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// Payload was received but could not be placed at its resolved path.
    #[error("Could not move payload to {path}: {message}")]
    StorageMoveFailed {
        /// Resolved destination path.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// A callback referenced a task the registry does not know.
    #[error("Unknown task identifier: {id}")]
    UnknownTask {
        /// The unknown identifier.
        id: String,
    },

    /// The transport refused to enqueue or report transfers.
    #[error("Transport error: {message}")]
    Transport {
        /// Detailed error message.
        message: String,
    },

    /// Transfer was cancelled through the transport.
    #[error("Download cancelled")]
    Cancelled,

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "not found", "permission denied").
        kind: String,
        /// Detailed error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid file name error.
    pub fn invalid_file_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFileName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a transfer failure without a status code.
    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::TransferFailed {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a transfer failure with an HTTP status code.
    pub fn transfer_failed_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::TransferFailed {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a storage move failure.
    pub fn storage_move_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageMoveFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown task error.
    pub fn unknown_task(id: impl Into<String>) -> Self {
        Self::UnknownTask { id: id.into() }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if a fresh `start` for the same URL may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed { .. } | Self::Io { .. } | Self::Transport { .. }
        )
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUrl { url, .. } => format!("'{url}' is not a valid download URL."),
            Self::InvalidFileName { name, .. } => {
                format!("'{name}' cannot be used as a file name.")
            }
            Self::TransferFailed {
                message,
                status_code: Some(code),
            } => format!("Download failed (HTTP {code}): {message}"),
            Self::TransferFailed { message, .. } => format!("Download failed: {message}"),
            Self::StorageMoveFailed { path, .. } => {
                format!("Downloaded file could not be saved to {path}.")
            }
            Self::UnknownTask { id } => format!("Download '{id}' is not tracked."),
            Self::Transport { message } => format!("Could not start download: {message}"),
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::Io { message, .. } => format!("File operation failed: {message}"),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
