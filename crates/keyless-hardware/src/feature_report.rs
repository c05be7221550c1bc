//! Single-target readers that report badges through HID feature reports.
//!
//! These readers hold no list of targets: each poll sends the read command
//! as an 8-byte feature report and reads an 8-byte feature report back. An
//! all-zero payload means no badge is in the field; anything else is the
//! badge identifier.

use crate::{
    HardwareError, Result,
    traits::{FeatureReportTransport, ScanDevice, Target},
    types::DeviceInfo,
};

/// Length of the command and response feature reports.
pub const REPORT_LENGTH: usize = 8;

/// Command byte that asks the reader for the badge in its field.
pub const READ_COMMAND: u8 = 0x8f;

/// Scan device for feature-report readers, generic over the transport.
///
/// Transport calls block, so each poll moves the transport onto the blocking
/// pool and takes it back when the transfer finishes.
///
/// # Examples
///
/// ```no_run
/// # #[cfg(feature = "hardware-hid")]
/// # async fn example() -> keyless_hardware::Result<()> {
/// use keyless_hardware::feature_report::FeatureReportDevice;
/// use keyless_hardware::hid::HidTransport;
/// use keyless_hardware::traits::ScanDevice;
///
/// let mut device = FeatureReportDevice::new(HidTransport::open_first()?);
/// let targets = device.poll().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeatureReportDevice<T: FeatureReportTransport> {
    transport: Option<T>,
    info: DeviceInfo,
}

impl<T: FeatureReportTransport> FeatureReportDevice<T> {
    /// Wrap an opened transport.
    pub fn new(transport: T) -> Self {
        let info = transport.info();
        Self {
            transport: Some(transport),
            info,
        }
    }

    async fn query(&mut self) -> Result<[u8; REPORT_LENGTH]> {
        let mut transport = self
            .transport
            .take()
            .ok_or_else(|| HardwareError::disconnected(self.info.name.clone()))?;

        let (transport, result) = tokio::task::spawn_blocking(move || {
            let result = read_report(&mut transport);
            (transport, result)
        })
        .await
        .map_err(|e| HardwareError::communication(format!("feature report task failed: {e}")))?;

        self.transport = Some(transport);
        result
    }
}

fn read_report<T: FeatureReportTransport>(transport: &mut T) -> Result<[u8; REPORT_LENGTH]> {
    let mut command = [0u8; REPORT_LENGTH];
    command[0] = READ_COMMAND;
    transport.send_feature_report(&command)?;

    let mut data = [0u8; REPORT_LENGTH];
    transport.get_feature_report(&mut data)?;
    Ok(data)
}

impl<T: FeatureReportTransport> ScanDevice for FeatureReportDevice<T> {
    async fn poll(&mut self) -> Result<Vec<Target>> {
        let data = self.query().await?;

        if data.iter().all(|b| *b == 0) {
            return Ok(Vec::new());
        }

        Ok(vec![Target::tag(data.to_vec())])
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the transport releases the underlying handle.
        self.transport = None;
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Transport that replays canned responses and records commands.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        responses: VecDeque<Result<[u8; REPORT_LENGTH]>>,
        commands: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl FeatureReportTransport for ScriptedTransport {
        fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
            self.commands.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
            let data = self.responses.pop_front().unwrap_or(Ok([0; REPORT_LENGTH]))?;
            buf.copy_from_slice(&data);
            Ok(REPORT_LENGTH)
        }

        fn info(&self) -> DeviceInfo {
            DeviceInfo::new("Scripted HID", "feature-report")
        }
    }

    #[tokio::test]
    async fn test_feature_report_all_zero_is_empty() {
        let mut device = FeatureReportDevice::new(ScriptedTransport::default());
        assert!(device.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feature_report_sends_read_command() {
        let transport = ScriptedTransport::default();
        let commands = transport.commands.clone();
        let mut device = FeatureReportDevice::new(transport);

        device.poll().await.unwrap();

        let commands = commands.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0], vec![0x8f, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_feature_report_non_zero_is_single_target() {
        let mut transport = ScriptedTransport::default();
        transport
            .responses
            .push_back(Ok([0x86, 0x04, 0xde, 0x7d, 0, 0, 0, 0]));
        let mut device = FeatureReportDevice::new(transport);

        let targets = device.poll().await.unwrap();
        assert_eq!(
            targets,
            vec![Target::tag(vec![0x86, 0x04, 0xde, 0x7d, 0, 0, 0, 0])]
        );
    }

    #[tokio::test]
    async fn test_feature_report_error_then_recovery() {
        let mut transport = ScriptedTransport::default();
        transport
            .responses
            .push_back(Err(HardwareError::communication("stall")));
        transport.responses.push_back(Ok([1, 0, 0, 0, 0, 0, 0, 0]));
        let mut device = FeatureReportDevice::new(transport);

        assert!(device.poll().await.is_err());
        assert_eq!(device.poll().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_feature_report_closed_device() {
        let mut device = FeatureReportDevice::new(ScriptedTransport::default());
        device.close().await.unwrap();

        assert!(matches!(
            device.poll().await,
            Err(HardwareError::Disconnected { .. })
        ));
        assert_eq!(device.info().name, "Scripted HID");
    }
}
