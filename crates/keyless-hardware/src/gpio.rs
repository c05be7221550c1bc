//! Strike actuator on a GPIO line driven through the sysfs interface.

use crate::{HardwareError, Result, traits::StrikeActuator, types::StrikeOutput};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Root of the kernel sysfs GPIO interface.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Output pin that energizes the strike relay.
///
/// Opening the pin exports it if needed, configures it as an output and
/// drives it low, so a freshly opened strike is locked.
#[derive(Debug)]
pub struct SysfsGpioPin {
    pin: u32,
    value_path: PathBuf,
}

impl SysfsGpioPin {
    /// Open `pin` under the default sysfs root.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the pin cannot be exported or
    /// configured as an output.
    pub async fn open(pin: u32) -> Result<Self> {
        Self::open_at(SYSFS_GPIO_ROOT, pin).await
    }

    /// Open `pin` under an explicit sysfs root.
    pub async fn open_at(root: impl AsRef<Path>, pin: u32) -> Result<Self> {
        let root = root.as_ref();
        let pin_dir = root.join(format!("gpio{pin}"));

        if !fs::try_exists(&pin_dir).await.unwrap_or(false) {
            debug!(pin, "exporting GPIO pin");
            fs::write(root.join("export"), pin.to_string())
                .await
                .map_err(|e| {
                    HardwareError::initialization_failed(format!("export GPIO {pin}: {e}"))
                })?;
        }

        fs::write(pin_dir.join("direction"), "out")
            .await
            .map_err(|e| {
                HardwareError::initialization_failed(format!("set GPIO {pin} direction: {e}"))
            })?;

        let mut gpio = Self {
            pin,
            value_path: pin_dir.join("value"),
        };
        gpio.write(StrikeOutput::Locked).await.map_err(|e| {
            HardwareError::initialization_failed(format!("lock GPIO {pin}: {e}"))
        })?;

        Ok(gpio)
    }

    /// The pin number.
    pub fn pin(&self) -> u32 {
        self.pin
    }

    async fn write(&mut self, output: StrikeOutput) -> Result<()> {
        fs::write(&self.value_path, output.level().to_string())
            .await
            .map_err(|e| HardwareError::actuator(format!("write GPIO {}: {e}", self.pin)))
    }
}

impl StrikeActuator for SysfsGpioPin {
    async fn drive(&mut self, output: StrikeOutput) -> Result<()> {
        self.write(output).await
    }
}
