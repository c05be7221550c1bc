//! Mock strike actuator for testing and development.
//!
//! Records every successful write with the (tokio) time it happened, so
//! tests can assert on open/close transitions and their timing.

use crate::{HardwareError, Result, traits::StrikeActuator, types::StrikeOutput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What the actuator was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    /// Output driven to the given state.
    Drive(StrikeOutput),

    /// Output forced to the safe state during teardown.
    Halt,
}

/// One recorded actuator write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorEvent {
    /// The write that was applied.
    pub action: ActuatorAction,

    /// When it was applied.
    pub at: Instant,
}

/// Mock strike actuator.
///
/// # Examples
///
/// ```
/// use keyless_hardware::mock::{ActuatorAction, MockActuator};
/// use keyless_hardware::traits::StrikeActuator;
/// use keyless_hardware::types::StrikeOutput;
///
/// #[tokio::main]
/// async fn main() -> keyless_hardware::Result<()> {
///     let (mut actuator, mut handle) = MockActuator::new();
///
///     actuator.drive(StrikeOutput::Unlocked).await?;
///     actuator.halt().await?;
///
///     let actions: Vec<_> = handle.events().iter().map(|e| e.action).collect();
///     assert_eq!(
///         actions,
///         vec![ActuatorAction::Drive(StrikeOutput::Unlocked), ActuatorAction::Halt]
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockActuator {
    events_tx: mpsc::UnboundedSender<ActuatorEvent>,
    fail_writes: Arc<AtomicBool>,
}

impl MockActuator {
    /// Create a new mock actuator and the handle that observes it.
    pub fn new() -> (Self, MockActuatorHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let fail_writes = Arc::new(AtomicBool::new(false));

        let actuator = Self {
            events_tx,
            fail_writes: fail_writes.clone(),
        };

        let handle = MockActuatorHandle {
            events_rx,
            seen: Vec::new(),
            fail_writes,
        };

        (actuator, handle)
    }

    fn record(&self, action: ActuatorAction) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HardwareError::actuator("mock actuator write failed"));
        }

        let _ = self.events_tx.send(ActuatorEvent {
            action,
            at: Instant::now(),
        });
        Ok(())
    }
}

impl StrikeActuator for MockActuator {
    async fn drive(&mut self, output: StrikeOutput) -> Result<()> {
        self.record(ActuatorAction::Drive(output))
    }

    async fn halt(&mut self) -> Result<()> {
        self.record(ActuatorAction::Halt)
    }
}

/// Handle for observing a mock actuator.
#[derive(Debug)]
pub struct MockActuatorHandle {
    events_rx: mpsc::UnboundedReceiver<ActuatorEvent>,
    seen: Vec<ActuatorEvent>,
    fail_writes: Arc<AtomicBool>,
}

impl MockActuatorHandle {
    /// All writes recorded so far, in order.
    pub fn events(&mut self) -> &[ActuatorEvent] {
        while let Ok(event) = self.events_rx.try_recv() {
            self.seen.push(event);
        }
        &self.seen
    }

    /// Number of writes that drove the strike open.
    pub fn opens(&mut self) -> usize {
        self.count(ActuatorAction::Drive(StrikeOutput::Unlocked))
    }

    /// Number of writes that drove the strike locked.
    pub fn closes(&mut self) -> usize {
        self.count(ActuatorAction::Drive(StrikeOutput::Locked))
    }

    /// Number of teardown halts.
    pub fn halts(&mut self) -> usize {
        self.count(ActuatorAction::Halt)
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn count(&mut self, action: ActuatorAction) -> usize {
        self.events().iter().filter(|e| e.action == action).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_actuator_records_in_order() {
        let (mut actuator, mut handle) = MockActuator::new();

        actuator.drive(StrikeOutput::Unlocked).await.unwrap();
        actuator.drive(StrikeOutput::Locked).await.unwrap();
        actuator.halt().await.unwrap();

        assert_eq!(handle.opens(), 1);
        assert_eq!(handle.closes(), 1);
        assert_eq!(handle.halts(), 1);
        assert_eq!(handle.events().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_actuator_failing_writes() {
        let (mut actuator, mut handle) = MockActuator::new();
        handle.fail_writes(true);

        assert!(actuator.drive(StrikeOutput::Unlocked).await.is_err());
        assert!(actuator.halt().await.is_err());
        assert!(handle.events().is_empty());

        handle.fail_writes(false);
        actuator.drive(StrikeOutput::Unlocked).await.unwrap();
        assert_eq!(handle.opens(), 1);
    }
}
