//! Login, logout and bearer authentication.
//!
//! `POST /login` opens an SSH connection with password credentials, stores
//! it in the session directory under a fresh UUID and returns a token bound
//! to that ID. Protected handlers take an [`AuthSession`], which checks the
//! `Authorization: Bearer <token>` header.

use std::sync::Arc;

use poem::http::{StatusCode, header};
use poem::web::{Data, Json};
use poem::{FromRequest, Request, RequestBody, Response, error::ResponseError, handler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use super::error::error_response;
use super::token::{Claims, TokenError};
use crate::remote::client::{Credentials, SshConnection, parse_port};
use crate::remote::error::{ConnectError, CoreError};
use crate::remote::executor::RemoteShell;
use crate::remote::session::RemoteSession;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("invalid login request: {0}")]
    InvalidRequest(String),

    #[error("invalid SSH credentials")]
    InvalidCredentials,

    #[error("could not reach {host}: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("server state unavailable")]
    MissingState,
}

impl AuthError {
    fn from_connect(error: ConnectError, host: &str) -> Self {
        match error {
            ConnectError::InvalidAddress(reason) => AuthError::InvalidRequest(reason),
            ConnectError::Rejected(_) => AuthError::InvalidCredentials,
            ConnectError::Timeout(_) | ConnectError::Transport(_) => AuthError::Unreachable {
                host: host.to_string(),
                reason: error.to_string(),
            },
        }
    }
}

impl ResponseError for AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Token(TokenError::Invalid(_)) => StatusCode::UNAUTHORIZED,
            AuthError::Token(TokenError::Sign(_)) | AuthError::MissingState => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn as_response(&self) -> Response {
        error_response(self.status(), self.to_string())
    }
}

/// SSH port as sent by clients, either a JSON number or a string.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PortValue {
    Number(u64),
    Text(String),
}

impl Default for PortValue {
    fn default() -> Self {
        PortValue::Text(String::new())
    }
}

impl PortValue {
    fn resolve(&self) -> Result<u16, ConnectError> {
        match self {
            PortValue::Number(port) => parse_port(&port.to_string()),
            PortValue::Text(port) => parse_port(port),
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: PortValue,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// The session a request's bearer token is bound to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub username: String,
}

impl From<Claims> for AuthSession {
    fn from(claims: Claims) -> Self {
        Self {
            session_id: claims.session_id,
            username: claims.username,
        }
    }
}

impl<'a> FromRequest<'a> for AuthSession {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> poem::Result<Self> {
        let state = req.data::<AppState>().ok_or(AuthError::MissingState)?;

        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header);

        let claims = state.tokens.verify(token).map_err(AuthError::from)?;
        Ok(claims.into())
    }
}

#[handler]
pub async fn login(
    state: Data<&AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let ip = request.ip.trim();
    let username = request.username.trim();
    if ip.is_empty() || username.is_empty() {
        return Err(AuthError::InvalidRequest(
            "ip and username are required".to_string(),
        ));
    }
    let port = request
        .port
        .resolve()
        .map_err(|e| AuthError::from_connect(e, ip))?;
    let host = format!("{ip}:{port}");

    let credentials = Credentials::new(username, request.password);
    let connection = SshConnection::connect(ip, port, &credentials, state.config.connect_timeout)
        .await
        .map_err(|e| AuthError::from_connect(e, &host))?;

    let session_id = Uuid::new_v4().to_string();
    let token = match state.tokens.issue(username, &session_id) {
        Ok(token) => token,
        Err(e) => {
            let _ = connection.disconnect().await;
            return Err(e.into());
        }
    };

    let session = RemoteSession::new(session_id.clone(), username, host.clone(), Arc::new(connection));
    state.directory.put(session_id.clone(), Arc::new(session));
    info!("Session {} opened for {}@{}", session_id, username, host);

    Ok(Json(LoginResponse { token }))
}

#[handler]
pub async fn logout(state: Data<&AppState>, auth: AuthSession) -> poem::Result<Json<MessageResponse>> {
    let session = state
        .directory
        .remove(&auth.session_id)
        .ok_or(CoreError::SessionNotFound)?;

    if let Err(e) = session.shell().disconnect().await {
        warn!("Failed to disconnect session {}: {}", session.id, e);
    }
    info!("Session {} closed for {}", session.id, auth.username);

    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}
