//! Command handlers.
//!
//! Each handler receives the composed [`CliContext`](crate::CliContext) and
//! prints its results to stdout.

pub mod download;
pub mod files;
pub mod image;
pub mod paths;
pub mod resume;

mod progress;
