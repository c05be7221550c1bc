//! Hardware layer and timing core for the keyless access controller.
//!
//! This crate owns everything that touches the door: the badge scanning
//! device and the loop that polls it, and the strike actuator and the loops
//! that open it for a bounded, extendable duration.
//!
//! # Design Philosophy
//!
//! - **Async-first**: device I/O goes through native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT). Blocking drivers run on the blocking
//!   pool.
//! - **Single owner**: each device is owned by exactly one task. Other tasks
//!   talk to it through channels, never through locks.
//! - **Enum dispatch**: the device family is chosen at runtime through
//!   [`AnyScanDevice`] and [`AnyActuator`], since RPITIT traits are not
//!   object-safe.
//! - **Explicit teardown**: [`Scanner::stop`] and [`DoorStrike::done`] join
//!   every task they spawned before returning.
//!
//! # Scanning
//!
//! ```no_run
//! use keyless_hardware::devices::AnyScanDevice;
//! use keyless_hardware::mock::MockScanDevice;
//! use keyless_hardware::scanner::{ScanEvent, Scanner, ScannerConfig};
//!
//! # async fn example() -> keyless_hardware::Result<()> {
//! let (device, _handle) = MockScanDevice::new();
//! let (mut scanner, mut events) =
//!     Scanner::new(AnyScanDevice::Mock(device), ScannerConfig::default());
//!
//! scanner.start()?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ScanEvent::Identifier(id) => println!("badge {id}"),
//!         ScanEvent::Error(e) => eprintln!("scan error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Strike
//!
//! ```no_run
//! use keyless_hardware::gpio::SysfsGpioPin;
//! use keyless_hardware::strike::{DoorStrike, StrikeConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> keyless_hardware::Result<()> {
//! let mut strike = DoorStrike::new(SysfsGpioPin::open(18).await?, StrikeConfig::default());
//! strike.unlock(Duration::from_secs(3)).await?;
//! strike.done().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Drivers
//!
//! The mocks and the sysfs GPIO actuator are always built. Reader drivers
//! are behind cargo features:
//!
//! - `hardware-pcsc`: PC/SC list-poll readers via `pcsc`
//! - `hardware-hid`: HID feature-report readers via `hidapi`

pub mod devices;
pub mod error;
pub mod feature_report;
pub mod gpio;
#[cfg(feature = "hardware-hid")]
pub mod hid;
pub mod mock;
pub mod pcsc_reader;
pub mod scanner;
pub mod strike;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyActuator, AnyScanDevice};
pub use error::{HardwareError, Result};
pub use scanner::{ScanEvent, ScanEvents, Scanner, ScannerConfig};
pub use strike::{DoorStrike, ExtendPolicy, StrikeConfig, StrikeControl, StrikeHandle};
pub use traits::{FeatureReportTransport, ScanDevice, StrikeActuator, Target};
pub use types::{DeviceInfo, StrikeOutput};
