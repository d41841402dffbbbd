//! Output parsers.
//!
//! Pure functions from one command's raw output to typed records. Tabular
//! parsers skip rows they cannot read; the inspect decoder fails only on
//! invalid JSON.

pub mod docker;
pub mod filesystem;
pub mod inspect;
pub mod system;

pub use inspect::InspectError;
