//! Download events published on the notification bus.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::types::{DownloadTask, TaskId};

/// Single discriminated union for everything the coordinator publishes.
///
/// ```typescript
/// type DownloadEvent =
///   | { type: "progress"; id: string; fraction: number; bytes_received: number; bytes_expected?: number }
///   | { type: "completed"; id: string; success: boolean; error?: DownloadError; path?: string };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Progress update for one task.
    Progress {
        /// Task identifier.
        id: TaskId,
        /// Received fraction in `[0, 1]` (0 when the size is unknown).
        fraction: f64,
        /// Bytes received so far. Never decreases for a given id.
        bytes_received: u64,
        /// Total bytes expected, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        bytes_expected: Option<u64>,
    },

    /// Terminal outcome of one task. Published exactly once per id.
    Completed {
        /// Task identifier.
        id: TaskId,
        /// Whether the payload was placed at its final path.
        success: bool,
        /// Failure reason when `success` is false.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<DownloadError>,
        /// Final location of the payload on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}

impl DownloadEvent {
    /// Build a progress event from the task's current counters.
    #[must_use]
    pub fn progress(task: &DownloadTask) -> Self {
        Self::Progress {
            id: task.id.clone(),
            fraction: task.fraction(),
            bytes_received: task.bytes_received,
            bytes_expected: task.bytes_expected,
        }
    }

    /// Build a successful completion event.
    pub fn succeeded(id: TaskId, path: impl Into<PathBuf>) -> Self {
        Self::Completed {
            id,
            success: true,
            error: None,
            path: Some(path.into()),
        }
    }

    /// Build a failed completion event.
    #[must_use]
    pub const fn failed(id: TaskId, error: DownloadError) -> Self {
        Self::Completed {
            id,
            success: false,
            error: Some(error),
            path: None,
        }
    }

    /// The task this event refers to.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        match self {
            Self::Progress { id, .. } | Self::Completed { id, .. } => id,
        }
    }

    /// Whether this is a terminal completion event.
    #[must_use]
    pub const fn is_completion(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
