//! Cerberus: remote Linux host management over SSH with a JSON HTTP API.

pub mod api;
pub mod config;
pub mod remote;
