//! Error types for hardware operations.
//!
//! This module defines error types for the scanning device, the strike
//! actuator and the loops that own them. Per-read failures are transient and
//! travel through the scanner's error channel; construction failures are
//! fatal; [`HardwareError::NotInitialized`] marks use after teardown.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Component was used after it was torn down.
    #[error("{component} is not initialized")]
    NotInitialized { component: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// A target was detected but its identifier could not be read.
    #[error("Unsupported tag: {message}")]
    UnsupportedTag { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Writing the strike output failed.
    #[error("Actuator error: {message}")]
    ActuatorError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new not-initialized error.
    pub fn not_initialized(component: impl Into<String>) -> Self {
        Self::NotInitialized {
            component: component.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new unsupported tag error.
    pub fn unsupported_tag(message: impl Into<String>) -> Self {
        Self::UnsupportedTag {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new actuator error.
    pub fn actuator(message: impl Into<String>) -> Self {
        Self::ActuatorError {
            message: message.into(),
        }
    }

    /// Whether this error reports use after teardown rather than a device
    /// fault.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_error() {
        let error = HardwareError::not_initialized("strike");
        assert!(error.is_not_initialized());
        assert_eq!(error.to_string(), "strike is not initialized");
    }

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("ACR122U");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert!(!error.is_not_initialized());
        assert_eq!(error.to_string(), "Device disconnected: ACR122U");
    }

    #[test]
    fn test_unsupported_tag_error() {
        let error = HardwareError::unsupported_tag("status 6a81");
        assert_eq!(error.to_string(), "Unsupported tag: status 6a81");
    }

    #[test]
    fn test_actuator_error() {
        let error = HardwareError::actuator("pin 18 busy");
        assert!(matches!(error, HardwareError::ActuatorError { .. }));
        assert_eq!(error.to_string(), "Actuator error: pin 18 busy");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: HardwareError = io.into();
        assert!(matches!(error, HardwareError::Io(_)));
    }
}
