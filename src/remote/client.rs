//! SSH client connection and command execution.
//!
//! ## Connection Lifecycle
//!
//! 1. **Client Configuration**: Build the russh client configuration. Sessions stay open
//!    until logout, so there is no inactivity timeout; keepalives detect dead peers.
//!
//! 2. **Connection Establishment**: Establish the TCP connection with a bounded timeout
//!    (5 seconds unless configured otherwise).
//!
//! 3. **Authentication**: Password authentication with the login [`Credentials`].
//!    Failures are never retried.
//!
//! 4. **Command Execution**: Every command opens a fresh session channel on the shared
//!    connection, so concurrent commands are multiplexed rather than serialized.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::{ChannelMsg, Disconnect, client};
use tracing::{info, warn};

use super::error::{ConnectError, ExecutionError};
use super::executor::{CommandOutput, RemoteShell};
use super::session::SshClientHandler;

/// Default SSH port used when none is supplied.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Build russh client configuration.
///
/// Creates an `Arc<client::Config>` with:
/// - No inactivity timeout (sessions end on logout or shutdown)
/// - Keepalive interval of 30 seconds with max 3 keepalives
pub(crate) fn build_client_config() -> Arc<client::Config> {
    Arc::new(client::Config {
        inactivity_timeout: None,
        keepalive_interval: Some(Duration::from_secs(30)),
        keepalive_max: 3,
        ..Default::default()
    })
}

/// Parse a port value as supplied by a login request.
///
/// An empty value selects [`DEFAULT_SSH_PORT`].
pub fn parse_port(raw: &str) -> Result<u16, ConnectError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_SSH_PORT);
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(ConnectError::InvalidAddress(format!(
            "invalid port number: {}",
            raw
        ))),
        Ok(port) => Ok(port),
    }
}

/// Username and password submitted at login.
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// An authenticated SSH connection.
pub struct SshConnection {
    handle: client::Handle<SshClientHandler>,
}

impl SshConnection {
    /// Connect to `host:port` and log in with a password.
    pub async fn connect(
        host: &str,
        port: u16,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, ConnectError> {
        if host.trim().is_empty() {
            return Err(ConnectError::InvalidAddress("host is required".to_string()));
        }

        let config = build_client_config();
        let connect_future = client::connect(config, (host, port), SshClientHandler);

        let mut handle = tokio::time::timeout(timeout, connect_future)
            .await
            .map_err(|_| ConnectError::Timeout(timeout))?
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let username = credentials.username.as_str();
        let accepted = handle
            .authenticate_password(username, &credentials.password)
            .await
            .map_err(|e| ConnectError::Transport(format!("password authentication failed: {e}")))?
            .success();

        if !accepted {
            warn!("SSH password rejected for {}@{}:{}", username, host, port);
            let _ = handle
                .disconnect(Disconnect::ByApplication, "Authentication failed", "en")
                .await;
            return Err(ConnectError::Rejected(username.to_string()));
        }

        info!("SSH connection established to {}@{}:{}", username, host, port);
        Ok(Self { handle })
    }
}

#[async_trait]
impl RemoteShell for SshConnection {
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecutionError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ExecutionError::Channel(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ExecutionError::Start(e.to_string()))?;

        let mut stdout = Vec::with_capacity(4096);
        let mut stderr = Vec::with_capacity(1024);
        let mut exit_code: Option<u32> = None;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    // ext == 1 is stderr in SSH protocol
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = Some(exit_status);
                }
                Some(ChannelMsg::Eof) => {
                    // Exit status may arrive after EOF
                    if exit_code.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        let _ = channel.close().await;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: exit_code.map(|c| c as i32).unwrap_or(-1),
        })
    }

    async fn disconnect(&self) -> Result<(), ExecutionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "Session closed by user", "en")
            .await
            .map_err(|e| ExecutionError::Channel(e.to_string()))
    }
}
