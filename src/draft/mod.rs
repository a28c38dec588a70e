//! Draft persistence
//!
//! Snapshots of in-progress registrations, written to a best-effort
//! key-value medium and mirrored in memory.

mod medium;
mod store;

pub use medium::*;
pub use store::*;
