//! Wiring of the scanner, strike, datastore and dispatcher.
//!
//! # Lifecycle
//!
//! 1. [`Controller::start`] opens the datastore, the actuator and the
//!    scanning device, spawns the strike and dispatcher loops and starts
//!    polling
//! 2. [`Controller::run_until`] waits for a shutdown signal (or for the scan
//!    events to end)
//! 3. Teardown stops the scanner, releases the strike, joins the dispatcher
//!    and closes the datastore, in that order

use crate::config::{ActuatorKind, ControllerConfig, ScanDeviceKind, StrikeSection};
use crate::dispatcher::{DispatchStats, Dispatcher};
use keyless_hardware::mock::{MockActuator, MockScanDevice};
use keyless_hardware::{
    AnyActuator, AnyScanDevice, DoorStrike, HardwareError, ScanDevice, Scanner, gpio::SysfsGpioPin,
};
use keyless_store::{AnyStore, StoreError};
use std::future::Future;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

/// Errors raised while starting or stopping the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A device could not be opened or released.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// The datastore could not be opened.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),

    /// The configured device needs a driver this binary was built without.
    #[error("{device} support requires building with the `{feature}` feature")]
    DriverNotBuilt {
        device: &'static str,
        feature: &'static str,
    },

    /// The dispatcher task panicked.
    #[error("Dispatcher task failed: {0}")]
    Dispatcher(#[from] JoinError),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Open the scanning device selected in the configuration.
///
/// # Errors
///
/// Returns `DriverNotBuilt` when the device's driver feature is disabled, or
/// the driver's initialization error.
pub fn open_scan_device(kind: ScanDeviceKind) -> ControllerResult<AnyScanDevice> {
    match kind {
        ScanDeviceKind::Mock => {
            let (device, _handle) = MockScanDevice::new();
            Ok(AnyScanDevice::Mock(device))
        }

        #[cfg(feature = "hardware-pcsc")]
        ScanDeviceKind::Pcsc => Ok(AnyScanDevice::Pcsc(
            keyless_hardware::pcsc_reader::PcscScanDevice::open()?,
        )),
        #[cfg(not(feature = "hardware-pcsc"))]
        ScanDeviceKind::Pcsc => Err(ControllerError::DriverNotBuilt {
            device: "PC/SC reader",
            feature: "hardware-pcsc",
        }),

        #[cfg(feature = "hardware-hid")]
        ScanDeviceKind::Hid => Ok(AnyScanDevice::Hid(
            keyless_hardware::feature_report::FeatureReportDevice::new(
                keyless_hardware::hid::HidTransport::open_first()?,
            ),
        )),
        #[cfg(not(feature = "hardware-hid"))]
        ScanDeviceKind::Hid => Err(ControllerError::DriverNotBuilt {
            device: "HID reader",
            feature: "hardware-hid",
        }),
    }
}

/// Acquire the strike actuator selected in the configuration.
///
/// # Errors
///
/// Returns the actuator's initialization error.
pub async fn open_actuator(strike: &StrikeSection) -> ControllerResult<AnyActuator> {
    match strike.actuator {
        ActuatorKind::Gpio => Ok(AnyActuator::Gpio(SysfsGpioPin::open(strike.gpio_pin).await?)),
        ActuatorKind::Mock => {
            let (actuator, _handle) = MockActuator::new();
            Ok(AnyActuator::Mock(actuator))
        }
    }
}

/// A running access controller.
#[derive(Debug)]
pub struct Controller {
    scanner: Scanner<AnyScanDevice>,
    strike: DoorStrike,
    dispatcher: JoinHandle<DispatchStats>,
    store: AnyStore,
}

impl Controller {
    /// Open every collaborator named in `config` and start the loops.
    ///
    /// The datastore is opened first so a bad badge list fails before any
    /// hardware is touched.
    pub async fn start(config: &ControllerConfig) -> ControllerResult<Self> {
        let store = AnyStore::open(&config.datastore).await?;
        let actuator = open_actuator(&config.strike).await?;
        let device = open_scan_device(config.scanner.device)?;

        Self::with_devices(device, actuator, store, config)
    }

    /// Start the loops over already opened collaborators.
    pub fn with_devices(
        device: AnyScanDevice,
        actuator: AnyActuator,
        store: AnyStore,
        config: &ControllerConfig,
    ) -> ControllerResult<Self> {
        let info = device.info();
        let strike = DoorStrike::new(actuator, config.strike.strike_config());
        let (mut scanner, events) = Scanner::new(device, config.scanner.scanner_config());

        let dispatcher = Dispatcher::new(
            store.clone(),
            strike.handle(),
            config.strike.grant_duration(),
        )
        .spawn(events);

        scanner.start()?;

        info!(
            device = %info.name,
            model = %info.model,
            grant_ms = config.strike.grant_duration_ms,
            "controller started"
        );

        Ok(Self {
            scanner,
            strike,
            dispatcher,
            store,
        })
    }

    /// Run until `shutdown` completes or the scan events end, then tear down.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> ControllerResult<DispatchStats> {
        let finished = tokio::select! {
            _ = shutdown => {
                info!("shutdown requested");
                None
            }
            result = &mut self.dispatcher => {
                warn!("scan events ended unexpectedly");
                Some(result)
            }
        };

        self.teardown(finished).await
    }

    /// Tear down immediately.
    pub async fn shutdown(self) -> ControllerResult<DispatchStats> {
        self.teardown(None).await
    }

    /// Every collaborator is released before an error is returned. A scanner
    /// close error is reported ahead of a dispatcher failure.
    async fn teardown(
        mut self,
        finished: Option<Result<DispatchStats, JoinError>>,
    ) -> ControllerResult<DispatchStats> {
        let stopped = self.scanner.stop().await;
        if let Err(e) = &stopped {
            warn!(error = %e, "scanner did not close cleanly");
        }

        self.strike.done().await;

        let joined = match finished {
            Some(result) => result,
            None => self.dispatcher.await,
        };

        self.store.close().await;
        info!("controller stopped");

        stopped?;
        Ok(joined?)
    }
}
