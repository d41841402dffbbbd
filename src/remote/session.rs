//! Authenticated remote sessions.
//!
//! # Architecture
//!
//! - `SshClientHandler`: A russh client handler that accepts all host keys (similar to
//!   `StrictHostKeyChecking=no` in OpenSSH).
//! - `RemoteSession`: One authenticated connection plus the metadata the API reports.
//!   Sessions are stored behind `Arc` in the session directory so command execution
//!   never holds a directory lock.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use russh::{client, keys};

use super::executor::RemoteShell;

/// Client handler for russh that accepts all host keys.
///
/// # Security Note
///
/// Host keys are not verified against a known_hosts file, which leaves the
/// connection open to man-in-the-middle attacks on untrusted networks.
pub struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// A live connection bound to the operator who authenticated it.
pub struct RemoteSession {
    pub id: String,
    /// Remote username the connection authenticated as
    pub principal: String,
    /// `host:port` the connection was opened to
    pub host: String,
    pub connected_at: DateTime<Utc>,
    shell: Arc<dyn RemoteShell>,
}

impl RemoteSession {
    pub fn new(
        id: impl Into<String>,
        principal: impl Into<String>,
        host: impl Into<String>,
        shell: Arc<dyn RemoteShell>,
    ) -> Self {
        Self {
            id: id.into(),
            principal: principal.into(),
            host: host.into(),
            connected_at: Utc::now(),
            shell,
        }
    }

    pub fn shell(&self) -> &dyn RemoteShell {
        self.shell.as_ref()
    }
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSession")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .field("host", &self.host)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::executor::testing::ScriptedShell;

    #[test]
    fn test_new_session_metadata() {
        let before = Utc::now();
        let session = RemoteSession::new("abc", "deploy", "10.0.0.5:22", Arc::new(ScriptedShell::new()));
        assert_eq!(session.id, "abc");
        assert_eq!(session.principal, "deploy");
        assert_eq!(session.host, "10.0.0.5:22");
        assert!(session.connected_at >= before);
    }

    #[test]
    fn test_debug_omits_connection() {
        let session = RemoteSession::new("abc", "deploy", "h:22", Arc::new(ScriptedShell::new()));
        let rendered = format!("{session:?}");
        assert!(rendered.contains("deploy"));
        assert!(!rendered.contains("shell"));
    }
}
