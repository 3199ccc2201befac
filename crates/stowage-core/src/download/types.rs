//! Core domain types for downloads.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Session identity used when the caller does not pick one.
pub const DEFAULT_SESSION_ID: &str = "stowage.background-download";

/// Opaque task handle assigned by the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a transport-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stable identity of a background transport session.
///
/// Survives process restarts: a transport reopened with the same session id
/// reports the transfers it was still running.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lifecycle state of a download task.
///
/// `Pending -> Transferring -> {Succeeded | Failed}`. Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Handed to the transport, no bytes reported yet.
    #[default]
    Pending,
    /// At least one progress callback was received.
    Transferring,
    /// Payload was placed at its final path.
    Succeeded,
    /// Transfer or placement failed.
    Failed,
}

impl TaskState {
    /// Whether this state is absorbing.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Transferring => "transferring",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outstanding or recently-finished transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Transport-assigned handle.
    pub id: TaskId,
    /// Session the transfer belongs to.
    pub session: SessionId,
    /// Remote resource identity (normalized URL string). De-duplication key.
    pub source_url: String,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Bytes received so far.
    pub bytes_received: u64,
    /// Total bytes expected, if the server reported a length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_expected: Option<u64>,
    /// Logical file name the finished payload is stored under.
    pub destination_name: String,
}

impl DownloadTask {
    /// Create a freshly started task in the `Pending` state.
    pub fn pending(
        id: TaskId,
        session: SessionId,
        source_url: impl Into<String>,
        destination_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            session,
            source_url: source_url.into(),
            state: TaskState::Pending,
            bytes_received: 0,
            bytes_expected: None,
            destination_name: destination_name.into(),
        }
    }

    /// Rebuild a task from what the transport still knows about it.
    #[must_use]
    pub fn from_snapshot(snapshot: &TransferSnapshot) -> Self {
        let state = if snapshot.active || snapshot.bytes_received > 0 {
            TaskState::Transferring
        } else {
            TaskState::Pending
        };

        Self {
            id: snapshot.id.clone(),
            session: snapshot.session.clone(),
            source_url: snapshot.source_url.clone(),
            state,
            bytes_received: snapshot.bytes_received,
            bytes_expected: snapshot.bytes_expected,
            destination_name: snapshot.destination_name.clone(),
        }
    }

    /// Fraction of the payload received, in `[0, 1]`. Zero when the size is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        match self.bytes_expected {
            Some(total) if total > 0 => (self.bytes_received as f64 / total as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Whether the task reached an absorbing state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// What the coordinator hands to the transport when starting a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    /// Parsed source URL.
    pub url: Url,
    /// Logical file name, persisted by the transport so it survives restarts.
    pub destination_name: String,
}

impl TransferRequest {
    /// Create a transfer request.
    pub fn new(url: Url, destination_name: impl Into<String>) -> Self {
        Self {
            url,
            destination_name: destination_name.into(),
        }
    }
}

/// A transfer the transport is still tracking, reported during reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSnapshot {
    /// Transport-assigned handle.
    pub id: TaskId,
    /// Session the transfer belongs to.
    pub session: SessionId,
    /// Remote resource identity.
    pub source_url: String,
    /// Logical file name recorded when the transfer began.
    pub destination_name: String,
    /// Bytes already on disk.
    pub bytes_received: u64,
    /// Total bytes expected, if known.
    pub bytes_expected: Option<u64>,
    /// Whether the transport is actively moving bytes for it.
    pub active: bool,
}
