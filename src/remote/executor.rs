//! Remote command execution.
//!
//! [`RemoteShell`] is the seam between the facades and the transport: the
//! SSH implementation lives in [`crate::remote::client`], tests substitute a
//! scripted shell.
//!
//! # Exit Status Policy
//!
//! [`execute`] applies one rule on top of the raw channel output:
//!
//! - exit status 0: success
//! - non-zero with non-empty stdout: success, the partial output is returned
//!   (for example `find` hitting unreadable directories)
//! - non-zero with empty stdout: [`ExecutionError::NonZeroExit`] carrying stderr

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::ExecutionError;

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status, or -1 when the server never reported one
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// A connection able to run one command per call on a fresh channel.
///
/// Implementations must be thread-safe (`Send + Sync`): concurrent calls on
/// the same connection are expected and must not serialize each other.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` to completion and collect its output.
    ///
    /// Only transport failures are errors here; the exit status is reported
    /// in [`CommandOutput::exit_code`].
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecutionError>;

    /// Close the underlying connection.
    async fn disconnect(&self) -> Result<(), ExecutionError>;
}

/// Run a command and apply the exit status policy.
pub async fn execute(
    shell: &dyn RemoteShell,
    command: &str,
) -> Result<CommandOutput, ExecutionError> {
    debug!("Executing remote command: {}", command);

    let output = shell.run(command).await?;

    if output.exit_code == 0 {
        return Ok(output);
    }

    if output.stdout.trim().is_empty() {
        return Err(ExecutionError::NonZeroExit {
            exit_code: output.exit_code,
            stderr: output.stderr,
        });
    }

    warn!(
        "Command exited with status {} but produced output, keeping partial result: {}",
        output.exit_code, command
    );
    Ok(output)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory shell for facade tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    type Rule = (String, Result<CommandOutput, String>);

    /// Answers commands from a list of `(substring, response)` rules.
    ///
    /// The first rule whose substring occurs in the command wins. Every
    /// command received is recorded for later assertions.
    #[derive(Default)]
    pub struct ScriptedShell {
        rules: Mutex<Vec<Rule>>,
        received: Mutex<Vec<String>>,
        disconnected: AtomicBool,
    }

    impl ScriptedShell {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer commands containing `needle` with a successful output.
        pub fn on(self, needle: &str, stdout: &str) -> Self {
            self.push(needle, Ok(CommandOutput::success(stdout)))
        }

        /// Answer commands containing `needle` with the given output.
        pub fn on_output(self, needle: &str, output: CommandOutput) -> Self {
            self.push(needle, Ok(output))
        }

        /// Answer commands containing `needle` with a non-zero exit.
        pub fn on_failure(self, needle: &str, stderr: &str) -> Self {
            self.push(needle, Ok(CommandOutput::failure(1, stderr)))
        }

        /// Fail commands containing `needle` at the transport level.
        pub fn on_transport_error(self, needle: &str, message: &str) -> Self {
            self.push(needle, Err(message.to_string()))
        }

        fn push(self, needle: &str, response: Result<CommandOutput, String>) -> Self {
            self.rules
                .lock()
                .unwrap()
                .push((needle.to_string(), response));
            self
        }

        pub fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }

        pub fn was_disconnected(&self) -> bool {
            self.disconnected.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteShell for ScriptedShell {
        async fn run(&self, command: &str) -> Result<CommandOutput, ExecutionError> {
            self.received.lock().unwrap().push(command.to_string());

            let rules = self.rules.lock().unwrap();
            match rules.iter().find(|(needle, _)| command.contains(needle.as_str())) {
                Some((_, Ok(output))) => Ok(output.clone()),
                Some((_, Err(message))) => Err(ExecutionError::Channel(message.clone())),
                None => Ok(CommandOutput::failure(127, format!("unscripted: {command}"))),
            }
        }

        async fn disconnect(&self) -> Result<(), ExecutionError> {
            self.disconnected.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
