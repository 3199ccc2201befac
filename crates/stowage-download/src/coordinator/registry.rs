//! Task registry: live tasks by id, with a secondary index by source URL.
//!
//! Pure state with no I/O or locking. The coordinator wraps it in its mutex.

use std::collections::{HashMap, HashSet};

use stowage_core::download::{DownloadTask, SessionId, TaskId, TaskState};

/// Result of applying a progress callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressApply {
    /// Counters moved forward. Carries the updated task.
    Applied(DownloadTask),
    /// `bytes_received` went backwards; nothing changed.
    Regressed {
        /// Value already on record.
        recorded: u64,
    },
    /// The task is settling its terminal outcome.
    Settling,
    /// No such task.
    Unknown,
}

/// Result of asking to settle a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleStart {
    /// The caller owns the terminal transition. Carries the task as recorded.
    Started(DownloadTask),
    /// Another terminal callback already claimed the task.
    AlreadySettling,
    /// No such task (never registered, or already removed).
    Unknown,
}

/// Live download tasks.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, DownloadTask>,
    by_url: HashMap<String, TaskId>,
    settling: HashSet<TaskId>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a task. Returns `false` and keeps the existing record if the id
    /// is already known.
    pub fn insert(&mut self, task: DownloadTask) -> bool {
        if self.tasks.contains_key(&task.id) {
            return false;
        }
        self.by_url
            .entry(task.source_url.clone())
            .or_insert_with(|| task.id.clone());
        self.tasks.insert(task.id.clone(), task);
        true
    }

    /// Task by id.
    pub fn get(&self, id: &TaskId) -> Option<&DownloadTask> {
        self.tasks.get(id)
    }

    /// Task by normalized source URL.
    pub fn find_by_url(&self, url: &str) -> Option<&DownloadTask> {
        self.by_url.get(url).and_then(|id| self.tasks.get(id))
    }

    /// Record a progress callback.
    ///
    /// `bytes_received` may not decrease and `bytes_expected` never shrinks.
    pub fn apply_progress(
        &mut self,
        id: &TaskId,
        bytes_received: u64,
        bytes_expected: Option<u64>,
    ) -> ProgressApply {
        if self.settling.contains(id) {
            return ProgressApply::Settling;
        }
        let Some(task) = self.tasks.get_mut(id) else {
            return ProgressApply::Unknown;
        };
        if bytes_received < task.bytes_received {
            return ProgressApply::Regressed {
                recorded: task.bytes_received,
            };
        }

        task.bytes_received = bytes_received;
        task.bytes_expected = match (task.bytes_expected, bytes_expected) {
            (Some(known), Some(reported)) => Some(known.max(reported)),
            (known, reported) => known.or(reported),
        };
        task.state = TaskState::Transferring;
        ProgressApply::Applied(task.clone())
    }

    /// Claim the terminal transition for a task.
    pub fn begin_settling(&mut self, id: &TaskId) -> SettleStart {
        let Some(task) = self.tasks.get(id) else {
            return SettleStart::Unknown;
        };
        if !self.settling.insert(id.clone()) {
            return SettleStart::AlreadySettling;
        }
        SettleStart::Started(task.clone())
    }

    /// Remove a settled task, stamping its terminal state on the returned record.
    pub fn finish(&mut self, id: &TaskId, state: TaskState) -> Option<DownloadTask> {
        self.settling.remove(id);
        let mut task = self.tasks.remove(id)?;
        if self.by_url.get(&task.source_url) == Some(id) {
            self.by_url.remove(&task.source_url);
        }
        task.state = state;
        Some(task)
    }

    /// Tasks of a session that have not been removed yet (settling included).
    pub fn pending_for(&self, session: &SessionId) -> usize {
        self.tasks
            .values()
            .filter(|task| &task.session == session)
            .count()
    }

    /// All tracked tasks, ordered by id.
    pub fn snapshot(&self) -> Vec<DownloadTask> {
        let mut tasks: Vec<_> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
