//! Command builders.
//!
//! Pure functions turning typed requests into shell command strings. Every
//! variable component passes through [`crate::remote::sanitize`]; validation
//! failures are reported before any command exists.

pub mod docker;
pub mod filesystem;
pub mod system;
