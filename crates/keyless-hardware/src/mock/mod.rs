//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod actuator;
pub mod scanner;

// Re-export commonly used types
pub use actuator::{ActuatorAction, ActuatorEvent, MockActuator, MockActuatorHandle};
pub use scanner::{DEFAULT_MOCK_LATENCY, MockScanDevice, MockScanHandle};
