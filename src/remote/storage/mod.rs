//! Session directory abstraction.
//!
//! - Dependency injection for testability
//! - Lock-free concurrent access via a DashMap implementation
//! - Sessions handed out as `Arc` clones, so no lock is held while a command runs

mod session;
mod traits;

pub use session::DashMapSessionDirectory;
pub use traits::SessionDirectory;
