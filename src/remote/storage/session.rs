//! DashMap-based session directory implementation.

use std::sync::Arc;

use dashmap::DashMap;

use crate::remote::session::RemoteSession;

use super::traits::SessionDirectory;

/// DashMap-based implementation of `SessionDirectory`.
pub struct DashMapSessionDirectory {
    sessions: DashMap<String, Arc<RemoteSession>>,
}

impl DashMapSessionDirectory {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for DashMapSessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDirectory for DashMapSessionDirectory {
    fn put(&self, session_id: String, session: Arc<RemoteSession>) {
        self.sessions.insert(session_id, session);
    }

    fn get(&self, session_id: &str) -> Option<Arc<RemoteSession>> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn remove(&self, session_id: &str) -> Option<Arc<RemoteSession>> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}
