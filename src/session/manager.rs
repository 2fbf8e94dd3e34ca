//! Per-user session registry
//!
//! Each connected user gets its own [`Session`] instance; nothing is shared
//! between sessions. The registry is in-memory only, so transcripts are lost
//! when the process restarts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::Session;

/// Handle to one session, lockable independently of the registry.
pub type SharedSession = Arc<RwLock<Session>>;

/// Registry of live sessions keyed by session id.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh empty session and return its handle.
    pub async fn create(&self) -> (Uuid, SharedSession) {
        let session = Session::new();
        let id = session.id;
        let handle = Arc::new(RwLock::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        tracing::debug!(session_id = %id, "created session");
        (id, handle)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session entirely. Returns false if the id was unknown.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "removed session");
        }
        removed
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
