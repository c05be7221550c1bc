//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model
/// and an optional serial number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "ACR122U", "Mock Scanner").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }
}

/// Physical output state of the door strike.
///
/// `Locked` is the safe state: it is what the strike is driven to on
/// expiry and on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeOutput {
    /// Strike energized, door can be opened.
    Unlocked,

    /// Strike released, door is held.
    Locked,
}

impl StrikeOutput {
    /// Logic level written to the output pin.
    pub fn level(self) -> u8 {
        match self {
            Self::Unlocked => 1,
            Self::Locked => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("ACR122U", "PC/SC reader").with_serial_number("123456789");

        assert_eq!(info.name, "ACR122U");
        assert_eq!(info.model, "PC/SC reader");
        assert_eq!(info.serial_number, Some("123456789".to_string()));
    }

    #[test]
    fn test_strike_output_levels() {
        assert_eq!(StrikeOutput::Unlocked.level(), 1);
        assert_eq!(StrikeOutput::Locked.level(), 0);
    }

    #[test]
    fn test_strike_output_serialization() {
        let json = serde_json::to_string(&StrikeOutput::Locked).unwrap();
        let output: StrikeOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(output, StrikeOutput::Locked);
    }
}
