//! Session directory trait definition.

use std::sync::Arc;

use crate::remote::session::RemoteSession;

/// Trait for session directory operations.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across
/// async tasks and must never expose their underlying map.
pub trait SessionDirectory: Send + Sync {
    /// Store a session, replacing any previous session with the same ID.
    fn put(&self, session_id: String, session: Arc<RemoteSession>);

    /// Get a session by ID.
    fn get(&self, session_id: &str) -> Option<Arc<RemoteSession>>;

    /// Remove a session by ID, returning it if it existed.
    fn remove(&self, session_id: &str) -> Option<Arc<RemoteSession>>;

    /// Get all session IDs.
    fn session_ids(&self) -> Vec<String>;

    /// Remove every session, returning them for cleanup.
    fn drain(&self) -> Vec<Arc<RemoteSession>> {
        self.session_ids()
            .iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }
}
