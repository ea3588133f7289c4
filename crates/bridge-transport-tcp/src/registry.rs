//! Concurrent registry of live bridge sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::session::BridgeSession;

/// Live sessions keyed by a monotonically increasing id.
///
/// Safe to mutate from the accept loop, session readers and broadcasters
/// at the same time. Iteration always works on a snapshot.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<u64, Arc<BridgeSession>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next session id.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a session under its own id.
    pub fn insert(&self, session: Arc<BridgeSession>) {
        self.sessions.insert(session.id(), session);
    }

    /// Removes a session; returns it if it was present.
    pub fn remove(&self, id: u64) -> Option<Arc<BridgeSession>> {
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    /// Whether a session with this id is registered.
    pub fn contains(&self, id: u64) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Copies the current sessions out so callers never hold shard locks.
    pub fn snapshot(&self) -> Vec<Arc<BridgeSession>> {
        self.sessions.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let reg = SessionRegistry::new();
        let a = reg.next_id();
        let b = reg.next_id();
        assert!(b > a);
        assert!(reg.is_empty());
    }
}
