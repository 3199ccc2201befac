//! Main CLI parser and top-level argument handling.

use clap::Parser;

use stowage_core::download::DEFAULT_SESSION_ID;

use crate::commands::Commands;

/// Background downloads and media storage.
#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Download files into a local store and manage stored images")]
#[command(version)]
pub struct Cli {
    /// Override the store directory for this invocation
    #[arg(long = "store-dir", global = true)]
    pub store_dir: Option<String>,

    /// Transfer session to attach to
    #[arg(long, global = true, env = "STOWAGE_SESSION", default_value = DEFAULT_SESSION_ID)]
    pub session: String,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
