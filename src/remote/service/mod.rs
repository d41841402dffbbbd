//! Session-bound service facades.
//!
//! Every operation takes a session ID, resolves it through the
//! [`SessionDirectory`], builds its commands, runs them on the session's
//! connection and hands the output to a parser. Failures carry the command
//! that produced them.

mod docker;
mod filesystem;
mod system;

use std::sync::Arc;

use tracing::{debug, error};

pub use docker::DockerService;
pub use filesystem::FileSystemService;
pub use system::SystemService;

use super::error::CoreError;
use super::executor::{CommandOutput, execute};
use super::session::RemoteSession;
use super::storage::SessionDirectory;

/// Resolves sessions and runs commands on them.
#[derive(Clone)]
pub struct SessionRunner {
    directory: Arc<dyn SessionDirectory>,
}

impl SessionRunner {
    pub fn new(directory: Arc<dyn SessionDirectory>) -> Self {
        Self { directory }
    }

    /// Look up a live session.
    pub fn session(&self, session_id: &str) -> Result<Arc<RemoteSession>, CoreError> {
        self.directory
            .get(session_id)
            .ok_or(CoreError::SessionNotFound)
    }
}

/// Run one command on `session` and return its output.
pub(crate) async fn run(session: &RemoteSession, command: &str) -> Result<CommandOutput, CoreError> {
    debug!(session_id = %session.id, "Running command: {}", command);
    execute(session.shell(), command).await.map_err(|source| {
        error!(session_id = %session.id, "Command failed: {}: {}", command, source);
        CoreError::execution(command, source)
    })
}

/// Run one command on `session` and return its stdout.
pub(crate) async fn run_stdout(session: &RemoteSession, command: &str) -> Result<String, CoreError> {
    run(session, command).await.map(|output| output.stdout)
}

/// All facades over one session directory.
#[derive(Clone)]
pub struct Services {
    pub system: SystemService,
    pub docker: DockerService,
    pub filesystem: FileSystemService,
}

impl Services {
    pub fn new(directory: Arc<dyn SessionDirectory>) -> Self {
        let runner = SessionRunner::new(directory);
        Self {
            system: SystemService::new(runner.clone()),
            docker: DockerService::new(runner.clone()),
            filesystem: FileSystemService::new(runner),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::SessionRunner;
    use crate::remote::executor::testing::ScriptedShell;
    use crate::remote::session::RemoteSession;
    use crate::remote::storage::{DashMapSessionDirectory, SessionDirectory};

    pub const SESSION_ID: &str = "session-1";

    /// A runner with one session answered by `shell`.
    pub fn runner_with(shell: Arc<ScriptedShell>) -> SessionRunner {
        let directory = Arc::new(DashMapSessionDirectory::new());
        directory.put(
            SESSION_ID.to_string(),
            Arc::new(RemoteSession::new(SESSION_ID, "ops", "10.0.0.5:22", shell)),
        );
        SessionRunner::new(directory)
    }
}
