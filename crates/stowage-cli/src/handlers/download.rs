//! Download command handler.

use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::info;

use stowage_core::ports::DownloadRequest;

use super::progress;
use crate::{CliContext, CliError};

/// Start downloading `url` and, unless detached, wait for it to finish.
pub async fn execute(ctx: &CliContext, url: &str, name: Option<String>, detach: bool) -> Result<()> {
    // Subscribe before starting so no event is missed.
    let mut events = ctx.events.subscribe();

    let mut request = DownloadRequest::new(url);
    if let Some(name) = name {
        request = request.with_destination_name(name);
    }
    let task = ctx.downloads.start(request).await.map_err(CliError::from)?;
    info!(id = %task.id, name = %task.destination_name, "Download started");

    if detach {
        println!("Queued {} as {}", task.destination_name, task.id);
        println!("Run `stowage resume` to finish it.");
        return Ok(());
    }

    let names = HashMap::from([(task.id.clone(), task.destination_name.clone())]);
    let outcomes = progress::watch(&mut events, &names, |id| async move {
        ctx.downloads.lookup_id(&id).await.is_some()
    })
    .await;
    if progress::report(&names, &outcomes) > 0 || outcomes.is_empty() {
        bail!("download of {url} did not complete");
    }
    Ok(())
}
