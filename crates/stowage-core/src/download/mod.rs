//! Download domain types, events and errors.
//!
//! This module contains pure data types for the download system. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Identities and task records (`TaskId`, `SessionId`, `DownloadTask`)
//! - `events` - Events published on the notification bus (`DownloadEvent`)
//! - `errors` - Error types for download operations

pub mod errors;
pub mod events;
pub mod types;

// Re-export commonly used types
pub use errors::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use types::{
    DEFAULT_SESSION_ID, DownloadTask, SessionId, TaskId, TaskState, TransferRequest,
    TransferSnapshot,
};
