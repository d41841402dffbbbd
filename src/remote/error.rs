//! Error types and classification of recognized remote outcomes.
//!
//! # Error Layers
//!
//! - [`ConnectError`]: establishing and authenticating an SSH connection.
//! - [`ExecutionError`]: running a single command on an open connection.
//! - [`CoreError`]: the taxonomy returned by every service facade operation.
//!
//! # Recognized Outcomes
//!
//! Some docker failures are expected answers rather than opaque failures.
//! [`classify_docker_error`] matches the stderr text of a failed command
//! against known patterns (case-insensitive) so facades can reclassify it:
//!
//! - an image still used by a container becomes an entry in
//!   `ImageDeleteResponse.errors`
//! - a missing image or object becomes [`CoreError::NotFound`]

use std::time::Duration;

use thiserror::Error;

/// Failure to establish an authenticated SSH connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to connect: {0}")]
    Transport(String),

    #[error("authentication rejected for user {0}")]
    Rejected(String),
}

/// Failure of a single remote command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to open channel: {0}")]
    Channel(String),

    #[error("failed to start command: {0}")]
    Start(String),

    #[error("exited with status {exit_code}: {}", stderr.trim())]
    NonZeroExit { exit_code: i32, stderr: String },
}

impl ExecutionError {
    /// Standard error text captured from the remote process, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecutionError::NonZeroExit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Whether the connection failed before the command could report a status.
    pub fn is_transport(&self) -> bool {
        matches!(self, ExecutionError::Channel(_) | ExecutionError::Start(_))
    }
}

/// Errors surfaced by the service facades.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session not found")]
    SessionNotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("command `{command}` failed: {source}")]
    Execution {
        command: String,
        #[source]
        source: ExecutionError,
    },

    #[error("failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn execution(command: impl Into<String>, source: ExecutionError) -> Self {
        CoreError::Execution {
            command: command.into(),
            source,
        }
    }

    pub fn parse(context: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::Parse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    /// Stderr of the failed command when this is an execution failure.
    pub fn remote_stderr(&self) -> Option<&str> {
        match self {
            CoreError::Execution { source, .. } => source.stderr(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Execution { source, .. } if source.is_transport())
    }
}

/// Docker error text meaning the referenced object does not exist.
const NOT_FOUND_ERRORS: &[&str] = &[
    "no such image",
    "no such object",
    "no such container",
    "unable to find image",
    "reference does not exist",
];

/// Docker error text meaning an image cannot be removed in its current state.
const IN_USE_ERRORS: &[&str] = &[
    "image is being used by running container",
    "image is being used by stopped container",
    "image is referenced in multiple repositories",
    "conflict:",
    "unable to delete",
    "unable to remove repository reference",
];

/// A docker failure recognized from its error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerOutcome {
    NotFound,
    InUse,
    Unrecognized,
}

/// Classify docker error text.
///
/// Not-found patterns take precedence over in-use patterns.
pub fn classify_docker_error(error: &str) -> DockerOutcome {
    let error_lower = error.to_lowercase();

    if NOT_FOUND_ERRORS.iter().any(|p| error_lower.contains(p)) {
        return DockerOutcome::NotFound;
    }

    if IN_USE_ERRORS.iter().any(|p| error_lower.contains(p)) {
        return DockerOutcome::InUse;
    }

    DockerOutcome::Unrecognized
}

/// Whether a single output line reports an in-use conflict.
pub fn is_in_use_line(line: &str) -> bool {
    classify_docker_error(line) == DockerOutcome::InUse
}

/// Map a failed docker command to `NotFound` when its stderr says so.
pub fn reclassify_not_found(error: CoreError, what: impl Into<String>) -> CoreError {
    match error.remote_stderr().map(classify_docker_error) {
        Some(DockerOutcome::NotFound) => CoreError::NotFound(what.into()),
        _ => error,
    }
}
