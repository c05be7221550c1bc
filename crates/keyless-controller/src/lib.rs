//! Keyless access controller.
//!
//! Ties the timing core from `keyless-hardware` to a badge datastore from
//! `keyless-store`:
//!
//! ```text
//! device -> Scanner -> (id | error) -> Dispatcher -> Authorizer
//!                                          |
//!                                          v
//!                               DoorStrike::unlock(grant) -> actuator
//! ```
//!
//! The `keyless` binary loads a [`ControllerConfig`], starts a
//! [`Controller`] and runs it until SIGINT or SIGTERM.

pub mod banner;
pub mod config;
pub mod controller;
pub mod dispatcher;

pub use config::{ConfigError, ConfigResult, ControllerConfig, load_config, parse_config};
pub use controller::{Controller, ControllerError, ControllerResult};
pub use dispatcher::{DispatchStats, Dispatcher};
