//! Background download coordinator for stowage.
//!
//! Creates, tracks and resumes download tasks on top of a `TransportPort`,
//! places finished payloads into the store, publishes progress and completion
//! events, and wakes the host once a session has drained.
//!
//! - `coordinator` - `DownloadCoordinator`, its registries and payload placement

// Re-export core types for convenience
pub use stowage_core::download::{
    DownloadError, DownloadEvent, DownloadResult, DownloadTask, SessionId, TaskId, TaskState,
};
pub use stowage_core::ports::{
    CompletionHandler, CoordinatorConfig, DownloadCoordinatorPort, DownloadEventEmitterPort,
    DownloadRequest, TransferOutcome, TransportEvent, TransportPort,
};

mod coordinator;

pub use coordinator::{
    CompletionRegistry, DownloadCoordinator, DownloadCoordinatorDeps, PayloadPlacement,
    ProgressApply, SettleStart, TaskRegistry, build_download_coordinator,
};
