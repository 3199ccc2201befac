//! Paths command handler.
//!
//! Displays the resolved directories in `key = value` form for diagnostics.

use anyhow::Result;

use stowage_core::paths::StoreDirSource;

use crate::CliContext;

/// Execute the paths command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let config = &ctx.config;
    let source = match config.store.source {
        StoreDirSource::Explicit => "--store-dir",
        StoreDirSource::EnvVar => "environment",
        StoreDirSource::Default => "default",
    };

    println!("store_dir = {} ({source})", config.store.path.display());
    println!("files_dir = {}", config.store_resolver().directory().display());
    println!("session = {}", config.session);
    println!("journal = {}", ctx.transport.journal_path().await.display());
    Ok(())
}
