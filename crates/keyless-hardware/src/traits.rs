//! Hardware device trait definitions.
//!
//! These traits establish the contract between the controller loops and the
//! peripherals they own: the badge scanning device polled by the
//! [`Scanner`](crate::scanner::Scanner) and the strike actuator driven by the
//! [`DoorStrike`](crate::strike::DoorStrike).
//!
//! Methods return `impl Future + Send` so that generic loops can be spawned
//! onto the multi-threaded runtime. Implementations still write plain
//! `async fn`.

use crate::error::Result;
use crate::types::{DeviceInfo, StrikeOutput};
use std::future::Future;

/// A target surfaced by one device poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A tag whose identifier bytes were read.
    Tag(Vec<u8>),

    /// A tag was detected but could not be read as a supported type.
    Unsupported {
        /// Why the tag was rejected.
        reason: String,
    },
}

impl Target {
    /// Create a tag target from UID bytes.
    pub fn tag(uid: impl Into<Vec<u8>>) -> Self {
        Self::Tag(uid.into())
    }

    /// Create an unsupported target.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }
}

/// Badge scanning device abstraction.
///
/// A device is opened and initialized by its constructor; once it exists it
/// is ready to be polled. Both device families (multi-target list-poll
/// readers and single-target feature-report readers) fit this contract: one
/// call to [`poll`](ScanDevice::poll) is one query to the hardware.
///
/// # Examples
///
/// ```
/// use keyless_hardware::traits::{ScanDevice, Target};
/// use keyless_hardware::mock::MockScanDevice;
///
/// # async fn example() -> keyless_hardware::Result<()> {
/// let (mut device, handle) = MockScanDevice::new();
/// handle.present(vec![vec![0xa1, 0xb2]]);
///
/// let targets = device.poll().await?;
/// assert_eq!(targets, vec![Target::tag(vec![0xa1, 0xb2])]);
/// # Ok(())
/// # }
/// ```
pub trait ScanDevice: Send {
    /// Query the device once for targets in the field.
    ///
    /// Returns an empty list when nothing is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the query itself failed. The caller treats this as
    /// transient and polls again.
    fn poll(&mut self) -> impl Future<Output = Result<Vec<Target>>> + Send;

    /// Release the device handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the device could not be released cleanly.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// Door strike actuator abstraction.
///
/// Exactly one task owns an actuator at a time; see
/// [`DoorStrike`](crate::strike::DoorStrike).
pub trait StrikeActuator: Send {
    /// Drive the strike output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be written.
    fn drive(&mut self, output: StrikeOutput) -> impl Future<Output = Result<()>> + Send;

    /// Force the output to the safe (locked) state before release.
    ///
    /// # Errors
    ///
    /// Returns an error if the output could not be written.
    fn halt(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.drive(StrikeOutput::Locked)
    }
}

/// Raw feature-report access for single-target HID readers.
///
/// Calls are blocking; [`FeatureReportDevice`](crate::feature_report::FeatureReportDevice)
/// runs them on the blocking pool.
pub trait FeatureReportTransport: Send + 'static {
    /// Send a feature report. `data[0]` is the report id or command byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer failed.
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;

    /// Read a feature report into `buf`, returning the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer failed.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_constructors() {
        assert_eq!(Target::tag([0x01, 0x02]), Target::Tag(vec![0x01, 0x02]));
        assert_eq!(
            Target::unsupported("status 6a81"),
            Target::Unsupported {
                reason: "status 6a81".to_string()
            }
        );
    }
}
