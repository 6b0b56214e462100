//! WebSocket session registry.
//!
//! Owned and mutated only by the web actor's worker. Registration order is
//! preserved: broadcasts deliver to sessions in the order they connected.

use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One established WebSocket connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    sender: mpsc::UnboundedSender<String>,
    alive: bool,
}

impl Session {
    /// Register the outbound channel of a freshly upgraded connection.
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: SessionId::new(),
            sender,
            alive: true,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Queue a payload toward the connection; a failed send marks the
    /// session dead but leaves removal to the end of the drain pass.
    fn deliver(&mut self, payload: &str) {
        if self.sender.send(payload.to_string()).is_err() {
            self.alive = false;
        }
    }
}

/// All connected sessions, in connection order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, session: Session) {
        info!(session = %session.id(), total = self.sessions.len() + 1, "session opened");
        self.sessions.push(session);
    }

    pub fn remove(&mut self, id: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() < before {
            info!(session = %id, total = self.sessions.len(), "session closed");
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Deliver one payload to every session in connection order.
    pub fn broadcast(&mut self, payload: &str) {
        for session in &mut self.sessions {
            session.deliver(payload);
        }
    }

    /// Drop sessions whose sends failed. Called once per drain pass.
    pub fn prune_dead(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.alive);
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            debug!(pruned, total = self.sessions.len(), "pruned dead sessions");
        }
        pruned
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_pair() -> (Session, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(tx), rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_all_sessions_in_order() {
        let mut registry = SessionRegistry::new();
        let (s1, mut rx1) = session_pair();
        let (s2, mut rx2) = session_pair();
        registry.register(s1);
        registry.register(s2);

        registry.broadcast("A");
        registry.broadcast("B");

        assert_eq!(rx1.recv().await.as_deref(), Some("A"));
        assert_eq!(rx1.recv().await.as_deref(), Some("B"));
        assert_eq!(rx2.recv().await.as_deref(), Some("A"));
        assert_eq!(rx2.recv().await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn failed_send_marks_dead_and_prunes_after_pass() {
        let mut registry = SessionRegistry::new();
        let (s1, rx1) = session_pair();
        let (s2, mut rx2) = session_pair();
        registry.register(s1);
        registry.register(s2);

        // First session's connection is gone.
        drop(rx1);

        registry.broadcast("A");
        registry.broadcast("B");
        // Both payloads were still attempted toward the live session.
        assert_eq!(rx2.recv().await.as_deref(), Some("A"));
        assert_eq!(rx2.recv().await.as_deref(), Some("B"));

        // The dead session survives the pass itself and goes at the end.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.prune_dead(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_unknown_session_is_inert() {
        let mut registry = SessionRegistry::new();
        let (s1, _rx) = session_pair();
        let id = s1.id();
        registry.register(s1);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }
}
