//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` or filesystem types in any signature
//! - Transport callbacks are values (`TransportEvent`), not trait callbacks
//! - Intent-based methods for the coordinator (not implementation-leaking)

pub mod download_coordinator;
pub mod download_event_emitter;
pub mod transport;

pub use download_coordinator::{
    CompletionHandler, CoordinatorConfig, DownloadCoordinatorPort, DownloadRequest,
};
pub use download_event_emitter::{
    BroadcastDownloadEmitter, DownloadEventEmitterPort, NoopDownloadEmitter,
};
pub use transport::{TransferOutcome, TransportEvent, TransportPort};
