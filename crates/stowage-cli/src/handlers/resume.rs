//! Resume command handler.
//!
//! Re-attaches to the session's journaled transfers, waits for each one and
//! then for the session's completion signal.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::oneshot;
use tracing::warn;

use super::progress;
use crate::{CliContext, CliError};

/// How long to wait for the session signal after the last task completed.
const SESSION_SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute the resume command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let mut events = ctx.events.subscribe();

    let restored = ctx
        .downloads
        .reconcile_after_restart()
        .await
        .map_err(CliError::from)?;
    if restored.is_empty() {
        println!("Nothing to resume in session {}", ctx.config.session);
        return Ok(());
    }

    for task in &restored {
        println!("Resuming {} ({})", task.destination_name, task.id);
    }

    let (done_tx, done_rx) = oneshot::channel();
    ctx.downloads
        .register_completion_handler(
            ctx.config.session.clone(),
            Box::new(move || {
                let _ = done_tx.send(());
            }),
        )
        .await;

    let names: HashMap<_, _> = restored
        .into_iter()
        .map(|task| (task.id, task.destination_name))
        .collect();
    let outcomes = progress::watch(&mut events, &names, |id| async move {
        ctx.downloads.lookup_id(&id).await.is_some()
    })
    .await;
    let failures = progress::report(&names, &outcomes);

    match tokio::time::timeout(SESSION_SIGNAL_TIMEOUT, done_rx).await {
        Ok(Ok(())) => println!("Session {} finished", ctx.config.session),
        _ => warn!(session = %ctx.config.session, "Session did not report completion"),
    }

    if failures > 0 {
        bail!("{failures} transfer(s) failed");
    }
    Ok(())
}
