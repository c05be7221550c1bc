//! Enum wrappers for hardware device dispatch.
//!
//! The device traits return `impl Future`, so they are not object-safe and
//! cannot be boxed as `dyn ScanDevice`. The wrappers here give the
//! controller one concrete type per role while the device family is picked
//! at runtime from configuration. Hardware variants only exist when their
//! driver feature is enabled.
//!
//! # Examples
//!
//! ```
//! use keyless_hardware::devices::AnyScanDevice;
//! use keyless_hardware::mock::MockScanDevice;
//! use keyless_hardware::traits::ScanDevice;
//!
//! let (device, _handle) = MockScanDevice::new();
//! let device = AnyScanDevice::Mock(device);
//! assert_eq!(device.info().name, "Mock Scanner");
//! ```

use crate::mock::{MockActuator, MockScanDevice};
use crate::traits::{ScanDevice, StrikeActuator, Target};
use crate::{DeviceInfo, Result, StrikeOutput, gpio::SysfsGpioPin};

#[cfg(feature = "hardware-hid")]
use crate::{feature_report::FeatureReportDevice, hid::HidTransport};
#[cfg(feature = "hardware-pcsc")]
use crate::pcsc_reader::PcscScanDevice;

/// Enum wrapper for scanning device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyScanDevice {
    /// Mock scanner for development and testing.
    Mock(MockScanDevice),

    /// PC/SC list-poll reader.
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscScanDevice),

    /// Single-target HID feature-report reader.
    #[cfg(feature = "hardware-hid")]
    Hid(FeatureReportDevice<HidTransport>),
}

impl ScanDevice for AnyScanDevice {
    async fn poll(&mut self) -> Result<Vec<Target>> {
        match self {
            Self::Mock(device) => device.poll().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.poll().await,
            #[cfg(feature = "hardware-hid")]
            Self::Hid(device) => device.poll().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.close().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.close().await,
            #[cfg(feature = "hardware-hid")]
            Self::Hid(device) => device.close().await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Mock(device) => device.info(),
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.info(),
            #[cfg(feature = "hardware-hid")]
            Self::Hid(device) => device.info(),
        }
    }
}

/// Enum wrapper for strike actuator dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyActuator {
    /// Sysfs GPIO output pin.
    Gpio(SysfsGpioPin),

    /// Mock actuator for development and testing.
    Mock(MockActuator),
}

impl StrikeActuator for AnyActuator {
    async fn drive(&mut self, output: StrikeOutput) -> Result<()> {
        match self {
            Self::Gpio(actuator) => actuator.drive(output).await,
            Self::Mock(actuator) => actuator.drive(output).await,
        }
    }

    async fn halt(&mut self) -> Result<()> {
        match self {
            Self::Gpio(actuator) => actuator.halt().await,
            Self::Mock(actuator) => actuator.halt().await,
        }
    }
}
