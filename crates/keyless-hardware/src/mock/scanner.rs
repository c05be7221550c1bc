//! Mock scanning device for testing and development.
//!
//! This module provides a simulated multi-target reader whose poll results
//! are scripted through a handle, so the polling loop can be exercised
//! without a physical reader attached.

use crate::{
    HardwareError, Result,
    traits::{ScanDevice, Target},
    types::DeviceInfo,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Default simulated I/O latency of one empty poll.
pub const DEFAULT_MOCK_LATENCY: Duration = Duration::from_millis(5);

/// Scripted outcome of a single poll.
#[derive(Debug, Clone)]
enum PollScript {
    Targets(Vec<Target>),
    Fail(String),
}

/// Mock list-poll scanning device.
///
/// Each poll consumes the next scripted outcome. When nothing is scripted the
/// poll waits for up to the simulated latency and then reports an empty
/// field, like a real reader with no badge present.
///
/// # Examples
///
/// ```
/// use keyless_hardware::mock::MockScanDevice;
/// use keyless_hardware::traits::{ScanDevice, Target};
///
/// #[tokio::main]
/// async fn main() -> keyless_hardware::Result<()> {
///     let (mut device, handle) = MockScanDevice::new();
///
///     handle.present(vec![vec![0xa1, 0xb2], vec![0xc3, 0xd4]]);
///     handle.fail("antenna fault");
///
///     assert_eq!(device.poll().await?.len(), 2);
///     assert!(device.poll().await.is_err());
///     assert!(device.poll().await?.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockScanDevice {
    script_rx: mpsc::UnboundedReceiver<PollScript>,
    latency: Duration,
    polls: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    fail_close: Arc<AtomicBool>,
}

impl MockScanDevice {
    /// Create a new mock scanning device with the default latency.
    pub fn new() -> (Self, MockScanHandle) {
        Self::with_latency(DEFAULT_MOCK_LATENCY)
    }

    /// Create a new mock scanning device with a custom empty-poll latency.
    pub fn with_latency(latency: Duration) -> (Self, MockScanHandle) {
        let (script_tx, script_rx) = mpsc::unbounded_channel();
        let polls = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        let fail_close = Arc::new(AtomicBool::new(false));

        let device = Self {
            script_rx,
            latency,
            polls: polls.clone(),
            closed: closed.clone(),
            fail_close: fail_close.clone(),
        };

        let handle = MockScanHandle {
            script_tx,
            polls,
            closed,
            fail_close,
        };

        (device, handle)
    }

    async fn next_script(&mut self) -> Option<PollScript> {
        match self.script_rx.try_recv() {
            Ok(script) => Some(script),
            Err(TryRecvError::Empty) => tokio::time::timeout(self.latency, self.script_rx.recv())
                .await
                .ok()
                .flatten(),
            Err(TryRecvError::Disconnected) => {
                tokio::time::sleep(self.latency).await;
                None
            }
        }
    }
}

impl ScanDevice for MockScanDevice {
    async fn poll(&mut self) -> Result<Vec<Target>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected("mock scanner closed"));
        }

        self.polls.fetch_add(1, Ordering::SeqCst);

        match self.next_script().await {
            Some(PollScript::Targets(targets)) => Ok(targets),
            Some(PollScript::Fail(message)) => Err(HardwareError::communication(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);

        if self.fail_close.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("mock scanner refused to close"));
        }

        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock Scanner", "list-poll")
    }
}

/// Handle for scripting a mock scanning device.
///
/// Outcomes are queued in order; each poll consumes one.
#[derive(Debug, Clone)]
pub struct MockScanHandle {
    script_tx: mpsc::UnboundedSender<PollScript>,
    polls: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    fail_close: Arc<AtomicBool>,
}

impl MockScanHandle {
    /// Queue a poll that finds the given UIDs in the field.
    pub fn present(&self, uids: Vec<Vec<u8>>) {
        self.present_targets(uids.into_iter().map(Target::Tag).collect());
    }

    /// Queue a poll that returns the given targets verbatim.
    pub fn present_targets(&self, targets: Vec<Target>) {
        let _ = self.script_tx.send(PollScript::Targets(targets));
    }

    /// Queue a poll that fails with a communication error.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.script_tx.send(PollScript::Fail(message.into()));
    }

    /// Make the next `close` report an error.
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Number of polls issued so far.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Whether the device has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
