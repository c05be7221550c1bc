//! Badge scanner polling loop.
//!
//! The [`Scanner`] owns a [`ScanDevice`] and runs one background task that
//! polls it continuously. Identifiers and transient errors travel to the
//! consumer on two bounded channels, bundled in [`ScanEvents`].
//!
//! # Lifecycle
//!
//! 1. Open the device (construction failures are fatal and happen here)
//! 2. Create the scanner with [`Scanner::new`] and keep the [`ScanEvents`]
//! 3. Call [`Scanner::start`] to spawn the polling task
//! 4. Drain events with [`ScanEvents::recv`]
//! 5. Call [`Scanner::stop`]; the event sequences end once drained
//!
//! # Examples
//!
//! ```
//! use keyless_hardware::mock::MockScanDevice;
//! use keyless_hardware::scanner::{ScanEvent, Scanner, ScannerConfig};
//!
//! #[tokio::main]
//! async fn main() -> keyless_hardware::Result<()> {
//!     let (device, handle) = MockScanDevice::new();
//!     let (mut scanner, mut events) = Scanner::new(device, ScannerConfig::default());
//!
//!     scanner.start()?;
//!     handle.present(vec![vec![0xa1, 0xb2]]);
//!
//!     if let Some(ScanEvent::Identifier(id)) = events.recv().await {
//!         assert_eq!(id.as_str(), "a1b2");
//!     }
//!
//!     scanner.stop().await?;
//!     Ok(())
//! }
//! ```

use crate::{
    HardwareError, Result,
    traits::{ScanDevice, Target},
};
use keyless_core::BadgeId;
use keyless_core::constants::{DEFAULT_IDLE_INTERVAL_MS, DEFAULT_SCAN_CHANNEL_CAPACITY};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Scanner tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Capacity of the identifier channel and of the error channel.
    pub channel_capacity: usize,

    /// Pause after a poll that found nothing. Zero yields to the scheduler.
    pub idle_interval: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_SCAN_CHANNEL_CAPACITY,
            idle_interval: Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS),
        }
    }
}

/// One item surfaced by the scanner.
#[derive(Debug)]
pub enum ScanEvent {
    /// A badge identifier was read.
    Identifier(BadgeId),

    /// A poll failed or a target could not be read.
    Error(HardwareError),
}

/// Consumer side of the scanner: the identifier and error sequences.
///
/// Both sequences end once the scanner has been stopped and their buffered
/// items have been drained.
#[derive(Debug)]
pub struct ScanEvents {
    identifiers: mpsc::Receiver<BadgeId>,
    errors: mpsc::Receiver<HardwareError>,
    identifiers_open: bool,
    errors_open: bool,
}

impl ScanEvents {
    /// Receive the next identifier or error, whichever arrives first.
    ///
    /// Returns `None` when both sequences have ended. Cancel-safe: no event is
    /// lost if the future is dropped before it completes.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        loop {
            if !self.identifiers_open && !self.errors_open {
                return None;
            }

            tokio::select! {
                id = self.identifiers.recv(), if self.identifiers_open => match id {
                    Some(id) => return Some(ScanEvent::Identifier(id)),
                    None => self.identifiers_open = false,
                },
                error = self.errors.recv(), if self.errors_open => match error {
                    Some(error) => return Some(ScanEvent::Error(error)),
                    None => self.errors_open = false,
                },
            }
        }
    }
}

/// Producer side handed to the polling task.
#[derive(Debug)]
struct EventSenders {
    identifiers: mpsc::Sender<BadgeId>,
    errors: mpsc::Sender<HardwareError>,
}

/// Owner of a scanning device and its polling task.
#[derive(Debug)]
pub struct Scanner<D: ScanDevice + 'static> {
    config: ScannerConfig,

    /// Held while idle; moved into the polling task while running and
    /// handed back when the task exits.
    device: Option<D>,

    senders: Option<EventSenders>,
    task: Option<JoinHandle<D>>,
    quit: CancellationToken,
    stopped: bool,
}

impl<D: ScanDevice + 'static> Scanner<D> {
    /// Wrap an opened device.
    ///
    /// A `channel_capacity` of zero is raised to one.
    pub fn new(device: D, config: ScannerConfig) -> (Self, ScanEvents) {
        let capacity = config.channel_capacity.max(1);
        let (id_tx, id_rx) = mpsc::channel(capacity);
        let (err_tx, err_rx) = mpsc::channel(capacity);

        let scanner = Self {
            config,
            device: Some(device),
            senders: Some(EventSenders {
                identifiers: id_tx,
                errors: err_tx,
            }),
            task: None,
            quit: CancellationToken::new(),
            stopped: false,
        };

        let events = ScanEvents {
            identifiers: id_rx,
            errors: err_rx,
            identifiers_open: true,
            errors_open: true,
        };

        (scanner, events)
    }

    /// Spawn the polling task.
    ///
    /// Calling `start` while the task is running does nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` once the scanner has been stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.stopped {
            return Err(HardwareError::not_initialized("scanner"));
        }
        if self.task.is_some() {
            return Ok(());
        }

        let (Some(device), Some(senders)) = (self.device.take(), self.senders.take()) else {
            return Err(HardwareError::not_initialized("scanner"));
        };

        self.task = Some(tokio::spawn(poll_loop(
            device,
            senders,
            self.quit.clone(),
            self.config.idle_interval,
        )));
        Ok(())
    }

    /// Whether the polling task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop polling and release the device.
    ///
    /// Signals the polling task, waits for it to exit, then closes the
    /// device. A poll already in flight is allowed to finish. Stopping twice
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the device on close, or a communication
    /// error if the polling task panicked.
    pub async fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.quit.cancel();
        self.senders = None;

        if let Some(task) = self.task.take() {
            let device = task
                .await
                .map_err(|e| HardwareError::communication(format!("scanner task failed: {e}")))?;
            self.device = Some(device);
        }

        match self.device.take() {
            Some(mut device) => {
                let info = device.info();
                device.close().await?;
                info!(device = %info.name, "scanner stopped");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<D: ScanDevice + 'static> Drop for Scanner<D> {
    fn drop(&mut self) {
        self.quit.cancel();
    }
}

async fn poll_loop<D: ScanDevice>(
    mut device: D,
    events: EventSenders,
    quit: CancellationToken,
    idle_interval: Duration,
) -> D {
    let info = device.info();
    info!(device = %info.name, model = %info.model, "scanner polling started");

    while !quit.is_cancelled() {
        let delivered = match device.poll().await {
            Ok(targets) if targets.is_empty() => {
                idle(idle_interval, &quit).await;
                true
            }
            Ok(targets) => publish(&events, targets, &quit).await,
            Err(e) => {
                debug!(error = %e, "scan poll failed");
                deliver(&events.errors, e, &quit).await
            }
        };

        if !delivered {
            if !quit.is_cancelled() {
                warn!("scan events receiver dropped, polling stopped");
            }
            break;
        }
    }

    debug!(device = %info.name, "scanner polling exited");
    device
}

async fn idle(interval: Duration, quit: &CancellationToken) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
        return;
    }

    tokio::select! {
        _ = quit.cancelled() => {}
        _ = tokio::time::sleep(interval) => {}
    }
}

async fn publish(events: &EventSenders, targets: Vec<Target>, quit: &CancellationToken) -> bool {
    for target in targets {
        let delivered = match target {
            Target::Tag(uid) => match BadgeId::from_uid(&uid) {
                Ok(id) => {
                    debug!(badge_id = %id, "badge scanned");
                    deliver(&events.identifiers, id, quit).await
                }
                Err(e) => {
                    deliver(&events.errors, HardwareError::unsupported_tag(e.to_string()), quit)
                        .await
                }
            },
            Target::Unsupported { reason } => {
                deliver(&events.errors, HardwareError::unsupported_tag(reason), quit).await
            }
        };

        if !delivered {
            return false;
        }
    }
    true
}

/// Send one item, giving up if the quit signal arrives first.
///
/// Returns `false` when the item was not delivered.
async fn deliver<T>(tx: &mpsc::Sender<T>, item: T, quit: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = quit.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
