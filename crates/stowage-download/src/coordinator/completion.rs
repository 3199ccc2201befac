//! Completion handler registry.
//!
//! Pure state tracker that pairs a session's "finished" signal with its
//! pending-task count and hands back the handler once both line up. No I/O,
//! no locking; the coordinator invokes returned handlers outside its lock.

use std::collections::HashMap;

use stowage_core::download::SessionId;
use stowage_core::ports::CompletionHandler;

/// Per-session state.
#[derive(Default)]
struct SessionSlot {
    /// The transport reported that it delivered everything for this session.
    signalled: bool,
    /// Deferred action, consumed when it fires.
    handler: Option<CompletionHandler>,
}

impl SessionSlot {
    fn is_idle(&self) -> bool {
        !self.signalled && self.handler.is_none()
    }
}

/// Session identity to deferred wake-up action.
///
/// A handler fires at most once, and only when its session is signalled and
/// has no pending tasks. Firing clears both the handler and the signal.
#[derive(Default)]
pub struct CompletionRegistry {
    sessions: HashMap<SessionId, SessionSlot>,
}

impl CompletionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handler, replacing an unfired one.
    ///
    /// Returns the handler back if it must fire immediately.
    pub fn register(
        &mut self,
        session: &SessionId,
        handler: CompletionHandler,
        pending: usize,
    ) -> Option<CompletionHandler> {
        let slot = self.sessions.entry(session.clone()).or_default();
        slot.handler = Some(handler);
        self.try_fire(session, pending)
    }

    /// Record the session-finished signal.
    pub fn signal(&mut self, session: &SessionId, pending: usize) -> Option<CompletionHandler> {
        self.sessions.entry(session.clone()).or_default().signalled = true;
        self.try_fire(session, pending)
    }

    /// Forget a signal that arrived before a new task joined the session.
    ///
    /// The handler then waits for the transport to signal the new batch.
    pub fn task_added(&mut self, session: &SessionId) {
        let Some(slot) = self.sessions.get_mut(session) else {
            return;
        };
        slot.signalled = false;
        if slot.is_idle() {
            self.sessions.remove(session);
        }
    }

    /// Re-check after one of the session's tasks reached a terminal state.
    pub fn task_settled(
        &mut self,
        session: &SessionId,
        pending: usize,
    ) -> Option<CompletionHandler> {
        self.try_fire(session, pending)
    }

    /// Whether the session signalled and has not fired since.
    pub fn is_signalled(&self, session: &SessionId) -> bool {
        self.sessions.get(session).is_some_and(|slot| slot.signalled)
    }

    /// Whether an unfired handler is stored for the session.
    pub fn has_handler(&self, session: &SessionId) -> bool {
        self.sessions
            .get(session)
            .is_some_and(|slot| slot.handler.is_some())
    }

    /// Sessions holding a handler that has not fired yet, ordered by id.
    pub fn pending_sessions(&self) -> Vec<SessionId> {
        let mut sessions: Vec<_> = self
            .sessions
            .iter()
            .filter(|(_, slot)| slot.handler.is_some())
            .map(|(session, _)| session.clone())
            .collect();
        sessions.sort();
        sessions
    }

    fn try_fire(&mut self, session: &SessionId, pending: usize) -> Option<CompletionHandler> {
        let slot = self.sessions.get_mut(session)?;
        if !slot.signalled || pending > 0 || slot.handler.is_none() {
            return None;
        }

        let handler = slot.handler.take();
        slot.signalled = false;
        if slot.is_idle() {
            self.sessions.remove(session);
        }
        handler
    }
}
