//! Remote command translation.
//!
//! Layers, leaves first: [`sanitize`] constrains untrusted input,
//! [`command`] builds shell commands, [`executor`] runs them over a
//! [`session`], [`parse`] turns output into [`types`], and [`service`]
//! ties the steps together per session.

pub mod client;
pub mod command;
pub mod error;
pub mod executor;
pub mod parse;
pub mod sanitize;
pub mod service;
pub mod session;
pub mod storage;
pub mod types;

pub use error::{ConnectError, CoreError, ExecutionError};
pub use executor::{CommandOutput, RemoteShell};
pub use service::Services;
pub use session::RemoteSession;
pub use storage::{DashMapSessionDirectory, SessionDirectory};
