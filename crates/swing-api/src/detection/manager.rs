//! Registry of live detection sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use swing_models::{SessionId, SessionSummary};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::session::SwingSession;
use crate::metrics;

/// A session shared between its ingestion loop and stats readers.
pub type SharedSession = Arc<Mutex<SwingSession>>;

/// Maps session ids to live sessions.
///
/// Built once per process and shared through the application state. The map
/// is written only on connect and disconnect.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    sequence: AtomicU64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session for a freshly accepted connection.
    pub async fn create_session(&self) -> (SessionId, SharedSession) {
        let accepted_at = Utc::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = SessionId::new(accepted_at, sequence);
        let session = Arc::new(Mutex::new(SwingSession::new(id.clone(), accepted_at)));

        let count = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.clone(), Arc::clone(&session));
            sessions.len()
        };
        metrics::set_active_sessions(count);
        debug!(session_id = %id, active = count, "Session created");

        (id, session)
    }

    pub async fn get_session(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session from the registry.
    ///
    /// Any analysis still running for it is left to finish on its own; its
    /// result is never read.
    pub async fn remove_session(&self, id: &SessionId) -> bool {
        let (removed, count) = {
            let mut sessions = self.sessions.write().await;
            let removed = sessions.remove(id).is_some();
            (removed, sessions.len())
        };
        if removed {
            metrics::set_active_sessions(count);
            debug!(session_id = %id, active = count, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Summaries of all live sessions, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions: Vec<SharedSession> = self.sessions.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            summaries.push(session.lock().await.summary());
        }
        summaries.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_remove() {
        let manager = SessionManager::new();
        let (id, session) = manager.create_session().await;

        assert_eq!(manager.len().await, 1);
        let fetched = manager.get_session(&id).await.expect("session registered");
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(fetched.lock().await.id(), &id);

        assert!(manager.remove_session(&id).await);
        assert!(manager.get_session(&id).await.is_none());
        assert!(!manager.remove_session(&id).await);
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let manager = SessionManager::new();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..100 {
            let (id, _) = manager.create_session().await;
            assert!(ids.insert(id));
        }
        assert_eq!(manager.len().await, 100);
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let manager = SessionManager::new();
        let (first, _) = manager.create_session().await;
        let (second, _) = manager.create_session().await;

        let summaries = manager.list_sessions().await;
        let ids: Vec<_> = summaries.iter().map(|s| s.session_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first));
        assert!(ids.contains(&second));
    }
}
