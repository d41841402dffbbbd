//! Configuration resolution for the Cerberus server.
//!
//! Values follow a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided value (highest priority)
//! 2. **Environment Variable** - Value from the environment (`.env` is loaded first)
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | 8080 | HTTP listen port |
//! | `BIND_ADDRESS` | 0.0.0.0 | HTTP listen address |
//! | `JWT_SECRET` | development placeholder | HS256 signing key |
//! | `JWT_EXPIRES_SECS` | 86400 | Token lifetime in seconds |
//! | `SSH_CONNECT_TIMEOUT` | 5s | SSH connection timeout in seconds |
//! | `SHUTDOWN_TIMEOUT` | 10s | Graceful shutdown timeout in seconds |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP listen address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Signing key used when `JWT_SECRET` is not set. Only suitable for development.
pub const DEFAULT_JWT_SECRET: &str = "cerberus-development-secret";

/// Default token lifetime (24 hours)
pub const DEFAULT_JWT_EXPIRES_SECS: u64 = 86_400;

/// Default SSH connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default graceful shutdown timeout in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub const PORT_ENV_VAR: &str = "PORT";
pub const BIND_ADDRESS_ENV_VAR: &str = "BIND_ADDRESS";
pub const JWT_SECRET_ENV_VAR: &str = "JWT_SECRET";
pub const JWT_EXPIRES_ENV_VAR: &str = "JWT_EXPIRES_SECS";
pub const CONNECT_TIMEOUT_ENV_VAR: &str = "SSH_CONNECT_TIMEOUT";
pub const SHUTDOWN_TIMEOUT_ENV_VAR: &str = "SHUTDOWN_TIMEOUT";

/// Read and parse an environment variable, ignoring unset or unparseable values.
fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse::<T>().ok())
}

/// Resolve the HTTP port with priority: parameter -> env var -> default
pub fn resolve_port(port_param: Option<u16>) -> u16 {
    if let Some(port) = port_param {
        return port;
    }

    env_parsed(PORT_ENV_VAR).unwrap_or(DEFAULT_PORT)
}

/// Resolve the HTTP bind address with priority: parameter -> env var -> default
pub fn resolve_bind_address(address_param: Option<String>) -> String {
    if let Some(address) = address_param {
        return address;
    }

    if let Ok(address) = env::var(BIND_ADDRESS_ENV_VAR)
        && !address.trim().is_empty()
    {
        return address.trim().to_string();
    }

    DEFAULT_BIND_ADDRESS.to_string()
}

/// Resolve the token signing secret with priority: parameter -> env var -> default
pub fn resolve_jwt_secret(secret_param: Option<String>) -> String {
    if let Some(secret) = secret_param {
        return secret;
    }

    if let Ok(secret) = env::var(JWT_SECRET_ENV_VAR)
        && !secret.is_empty()
    {
        return secret;
    }

    DEFAULT_JWT_SECRET.to_string()
}

/// Resolve the token lifetime in seconds with priority: parameter -> env var -> default
pub fn resolve_jwt_expires(expires_param: Option<u64>) -> u64 {
    if let Some(expires) = expires_param {
        return expires;
    }

    env_parsed(JWT_EXPIRES_ENV_VAR).unwrap_or(DEFAULT_JWT_EXPIRES_SECS)
}

/// Resolve the SSH connection timeout in seconds with priority: parameter -> env var -> default
pub fn resolve_connect_timeout(timeout_param: Option<u64>) -> u64 {
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    env_parsed(CONNECT_TIMEOUT_ENV_VAR).unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS)
}

/// Resolve the graceful shutdown timeout in seconds with priority: parameter -> env var -> default
pub fn resolve_shutdown_timeout(timeout_param: Option<u64>) -> u64 {
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    env_parsed(SHUTDOWN_TIMEOUT_ENV_VAR).unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS)
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    pub jwt_secret: String,
    pub jwt_expires: Duration,
    pub connect_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl AppConfig {
    /// Resolve every value from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let config = Self {
            port: resolve_port(None),
            bind_address: resolve_bind_address(None),
            jwt_secret: resolve_jwt_secret(None),
            jwt_expires: Duration::from_secs(resolve_jwt_expires(None)),
            connect_timeout: Duration::from_secs(resolve_connect_timeout(None)),
            shutdown_timeout: Duration::from_secs(resolve_shutdown_timeout(None)),
        };

        if config.uses_default_secret() {
            warn!(
                "{} is not set, signing tokens with the development secret",
                JWT_SECRET_ENV_VAR
            );
        }

        config
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expires: Duration::from_secs(DEFAULT_JWT_EXPIRES_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}
