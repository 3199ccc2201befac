//! `stowage` command-line adapter.
//!
//! [`bootstrap`] wires the HTTP transport, the download coordinator and the
//! media stores together; handlers only see the resulting [`CliContext`].

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ImageCommand};
pub use error::CliError;
pub use parser::Cli;
