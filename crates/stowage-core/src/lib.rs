//! Core domain types and port definitions for stowage.
//!
//! - `download` - task identities, task state, events and errors
//! - `ports` - trait seams for the transport, the event bus and the coordinator
//! - `paths` - storage root resolution and the storage resolver

pub mod download;
pub mod paths;
pub mod ports;

// Re-export commonly used types for convenience
pub use download::{
    DEFAULT_SESSION_ID, DownloadError, DownloadEvent, DownloadResult, DownloadTask, SessionId,
    TaskId, TaskState, TransferRequest, TransferSnapshot,
};
pub use ports::{
    BroadcastDownloadEmitter, CompletionHandler, CoordinatorConfig, DownloadCoordinatorPort,
    DownloadEventEmitterPort, DownloadRequest, NoopDownloadEmitter, TransferOutcome,
    TransportEvent, TransportPort,
};

// Re-export path utilities
pub use paths::{
    DEFAULT_ROOT_SEGMENT, DirectoryCreationStrategy, PathError, STORE_DIR_ENV, StorageResolver,
    StoreDirResolution, StoreDirSource, StoreLocation, data_root, ensure_directory,
    resolve_store_dir, transport_work_dir, validate_file_name, verify_writable,
};
