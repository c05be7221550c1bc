//! Shared vocabulary for the keyless access controller.
//!
//! Every other crate in the workspace speaks in terms of the types defined
//! here: the [`BadgeId`] produced by a scanner and looked up in a datastore,
//! the [`BadgeKind`] recorded alongside it, and the timing constants the
//! controller falls back to when configuration is silent.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
