//! Terminal output for download events.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use stowage_core::download::{DownloadError, DownloadEvent, TaskId};

/// Terminal result of one watched task.
pub type Outcome = Result<PathBuf, DownloadError>;

/// How long to keep reading after a lag before giving up on a dropped
/// completion event.
const LAG_GRACE: Duration = Duration::from_millis(250);

/// Print progress for `watched` tasks until each has completed.
///
/// `names` maps ids to display names. `is_live` reports whether the
/// coordinator still tracks an id; it is consulted after the bus dropped
/// events, so a task whose completion was lost does not block forever.
/// Returns outcomes in completion order.
pub async fn watch<F, Fut>(
    events: &mut Receiver<DownloadEvent>,
    names: &HashMap<TaskId, String>,
    mut is_live: F,
) -> Vec<(TaskId, Outcome)>
where
    F: FnMut(TaskId) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut remaining: HashSet<TaskId> = names.keys().cloned().collect();
    let mut outcomes = Vec::with_capacity(remaining.len());
    // Settled while the bus lagged; their completion may still be buffered.
    let mut unaccounted: HashSet<TaskId> = HashSet::new();

    while !remaining.is_empty() {
        let received = if unaccounted.is_empty() {
            events.recv().await
        } else if let Ok(received) = tokio::time::timeout(LAG_GRACE, events.recv()).await {
            received
        } else {
            for id in unaccounted.drain() {
                if remaining.remove(&id) {
                    outcomes.push((
                        id,
                        Err(DownloadError::transport("completion event was dropped")),
                    ));
                }
            }
            continue;
        };

        let event = match received {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Progress output fell behind");
                let ids: Vec<_> = remaining.iter().cloned().collect();
                for id in ids {
                    if !is_live(id.clone()).await {
                        unaccounted.insert(id);
                    }
                }
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            DownloadEvent::Progress {
                id,
                fraction,
                bytes_received,
                bytes_expected,
            } if remaining.contains(&id) => {
                let name = names.get(&id).map_or("?", String::as_str);
                println!("{}", progress_line(name, fraction, bytes_received, bytes_expected));
            }
            DownloadEvent::Completed {
                id,
                success,
                error,
                path,
            } if remaining.remove(&id) => {
                unaccounted.remove(&id);
                let outcome = match (success, path, error) {
                    (true, Some(path), _) => Ok(path),
                    (_, _, Some(error)) => Err(error),
                    _ => Err(DownloadError::transport("completed without a result")),
                };
                outcomes.push((id, outcome));
            }
            _ => {}
        }
    }

    outcomes
}

/// Print a summary line per outcome. Returns the number of failures.
pub fn report(names: &HashMap<TaskId, String>, outcomes: &[(TaskId, Outcome)]) -> usize {
    let mut failures = 0;
    for (id, outcome) in outcomes {
        let name = names.get(id).map_or("?", String::as_str);
        match outcome {
            Ok(path) => println!("✓ {name} -> {}", path.display()),
            Err(e) => {
                failures += 1;
                println!("✗ {name}: {}", e.user_message());
            }
        }
    }
    failures
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn progress_line(name: &str, fraction: f64, received: u64, expected: Option<u64>) -> String {
    match expected {
        Some(total) => format!(
            "{name}: {:>5.1}% ({} / {})",
            fraction * 100.0,
            format_bytes(received),
            format_bytes(total)
        ),
        None => format!("{name}: {}", format_bytes(received)),
    }
}
