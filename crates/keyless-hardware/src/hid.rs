//! HID transport for feature-report readers (feature `hardware-hid`).

use crate::{HardwareError, Result, traits::FeatureReportTransport, types::DeviceInfo};
use hidapi::{HidApi, HidDevice};
use std::fmt;

/// Feature-report transport backed by `hidapi`.
pub struct HidTransport {
    device: HidDevice,
    info: DeviceInfo,
}

impl HidTransport {
    /// Open the first HID device the system enumerates.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the HID subsystem cannot be
    /// initialized, no device is attached, or the device cannot be opened.
    pub fn open_first() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| HardwareError::initialization_failed(format!("hidapi: {e}")))?;

        let found = api
            .device_list()
            .next()
            .ok_or_else(|| HardwareError::initialization_failed("no HID device found"))?;

        let device = found
            .open_device(&api)
            .map_err(|e| HardwareError::initialization_failed(format!("open HID device: {e}")))?;

        let mut info = DeviceInfo::new(
            found.product_string().unwrap_or("HID reader"),
            format!("{:04x}:{:04x}", found.vendor_id(), found.product_id()),
        );
        if let Some(serial) = found.serial_number() {
            info = info.with_serial_number(serial);
        }

        Ok(Self { device, info })
    }
}

impl fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidTransport")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl FeatureReportTransport for HidTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .send_feature_report(data)
            .map_err(|e| HardwareError::communication(format!("send feature report: {e}")))
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.device
            .get_feature_report(buf)
            .map_err(|e| HardwareError::communication(format!("get feature report: {e}")))
    }

    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }
}
