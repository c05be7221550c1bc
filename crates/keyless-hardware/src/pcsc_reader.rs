//! PC/SC list-poll reader.
//!
//! Every poll walks the readers known to the PC/SC daemon and reads the UID
//! of the card sitting on each one with the `GET DATA` pseudo-APDU, so one
//! poll can surface several targets. The device itself is only built with
//! the `hardware-pcsc` feature; response parsing is always available.

use crate::traits::Target;

/// `GET DATA` pseudo-APDU returning the UID of the card in the field.
pub const GET_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Status word of a successful response.
pub const STATUS_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Turn a `GET DATA` response into a target.
///
/// ```
/// use keyless_hardware::pcsc_reader::parse_uid_response;
/// use keyless_hardware::traits::Target;
///
/// assert_eq!(
///     parse_uid_response(&[0x86, 0x04, 0xde, 0x7d, 0x90, 0x00]),
///     Target::tag(vec![0x86, 0x04, 0xde, 0x7d])
/// );
/// ```
pub fn parse_uid_response(response: &[u8]) -> Target {
    match response.split_last_chunk::<2>() {
        Some((uid, status)) if *status == STATUS_SUCCESS && !uid.is_empty() => {
            Target::tag(uid.to_vec())
        }
        Some((_, status)) => Target::unsupported(format!(
            "card answered GET DATA with status {:02x}{:02x}",
            status[0], status[1]
        )),
        None => Target::unsupported(format!("short GET DATA response: {response:02x?}")),
    }
}

#[cfg(feature = "hardware-pcsc")]
pub use device::PcscScanDevice;

#[cfg(feature = "hardware-pcsc")]
mod device {
    use super::{GET_UID_APDU, parse_uid_response};
    use crate::{
        HardwareError, Result,
        traits::{ScanDevice, Target},
        types::DeviceInfo,
    };
    use pcsc::{Context, Error as PcscError, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode};
    use tracing::trace;

    /// List-poll scan device backed by the PC/SC daemon.
    pub struct PcscScanDevice {
        context: Option<Context>,
    }

    impl std::fmt::Debug for PcscScanDevice {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("PcscScanDevice")
                .field("open", &self.context.is_some())
                .finish()
        }
    }

    impl PcscScanDevice {
        /// Establish a PC/SC context.
        ///
        /// # Errors
        ///
        /// Returns `InitializationFailed` if the PC/SC daemon is unreachable.
        pub fn open() -> Result<Self> {
            let context = Context::establish(Scope::User).map_err(|e| {
                HardwareError::initialization_failed(format!("PC/SC context: {e}"))
            })?;
            Ok(Self {
                context: Some(context),
            })
        }
    }

    fn list_targets(context: &Context) -> Result<Vec<Target>> {
        let mut names = [0u8; 2048];
        let readers = match context.list_readers(&mut names) {
            Ok(readers) => readers,
            Err(PcscError::NoReadersAvailable) => return Ok(Vec::new()),
            Err(e) => return Err(HardwareError::communication(format!("list readers: {e}"))),
        };

        let mut targets = Vec::new();
        for reader in readers {
            let card = match context.connect(reader, ShareMode::Shared, Protocols::ANY) {
                Ok(card) => card,
                Err(PcscError::NoSmartcard | PcscError::RemovedCard) => continue,
                Err(e) => {
                    targets.push(Target::unsupported(format!(
                        "connect {}: {e}",
                        reader.to_string_lossy()
                    )));
                    continue;
                }
            };

            let mut response = [0u8; MAX_BUFFER_SIZE];
            match card.transmit(&GET_UID_APDU, &mut response) {
                Ok(response) => targets.push(parse_uid_response(response)),
                Err(e) => targets.push(Target::unsupported(format!("GET DATA: {e}"))),
            }
            trace!(reader = %reader.to_string_lossy(), "polled PC/SC reader");
        }

        Ok(targets)
    }

    impl ScanDevice for PcscScanDevice {
        async fn poll(&mut self) -> Result<Vec<Target>> {
            let context = self
                .context
                .clone()
                .ok_or_else(|| HardwareError::disconnected("PC/SC context released"))?;

            tokio::task::spawn_blocking(move || list_targets(&context))
                .await
                .map_err(|e| HardwareError::communication(format!("PC/SC task failed: {e}")))?
        }

        async fn close(&mut self) -> Result<()> {
            match self.context.take() {
                Some(context) => context.release().map_err(|(_, e)| {
                    HardwareError::communication(format!("release PC/SC context: {e}"))
                }),
                None => Ok(()),
            }
        }

        fn info(&self) -> DeviceInfo {
            DeviceInfo::new("PC/SC", "list-poll")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0x04, 0xab, 0xcd, 0xef, 0x90, 0x00], &[0x04, 0xab, 0xcd, 0xef])]
    #[case(&[0x01, 0x90, 0x00], &[0x01])]
    fn test_parse_uid_success(#[case] response: &[u8], #[case] uid: &[u8]) {
        assert_eq!(parse_uid_response(response), Target::tag(uid.to_vec()));
    }

    #[rstest]
    #[case(&[0x6a, 0x81])]
    #[case(&[0x90, 0x00])]
    #[case(&[0x04, 0xab, 0x63, 0x00])]
    #[case(&[0x90])]
    #[case(&[])]
    fn test_parse_uid_unsupported(#[case] response: &[u8]) {
        assert!(matches!(
            parse_uid_response(response),
            Target::Unsupported { .. }
        ));
    }
}
