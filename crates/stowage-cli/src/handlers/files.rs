//! Handlers for files already placed in the store.

use anyhow::Result;

use crate::{CliContext, CliError};

/// Print the store path for `name`.
pub async fn path(ctx: &CliContext, name: &str) -> Result<()> {
    let path = ctx.downloads.local_path(name).map_err(CliError::from)?;
    println!("{}", path.display());
    if !ctx.downloads.file_exists(name).await {
        eprintln!("(no file stored under this name yet)");
    }
    Ok(())
}

/// Delete `name` from the store.
pub async fn remove(ctx: &CliContext, name: &str) -> Result<()> {
    if ctx.downloads.delete_file(name).await.map_err(CliError::from)? {
        println!("Removed {name}");
    } else {
        println!("Nothing stored under {name}");
    }
    Ok(())
}
