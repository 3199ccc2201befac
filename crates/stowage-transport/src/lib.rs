//! Durable HTTP transport for stowage.
//!
//! Implements `TransportPort` on top of `reqwest`. Every live transfer is
//! recorded in a per-session journal and streamed into a partial payload
//! file, so a transport reopened under the same session identity can report
//! and resume what a previous process left behind.
//!
//! - `config` - `HttpTransportConfig`
//! - `journal` - on-disk record of live transfers
//! - `throttle` - progress rate limiting
//! - `http` - `HttpTransport` and the per-transfer worker

mod config;
mod http;
mod journal;
mod throttle;

pub use config::HttpTransportConfig;
pub use http::HttpTransport;
pub use journal::{Journal, JournalEntry};
pub use throttle::ProgressThrottle;
