//! Door strike control.
//!
//! A [`DoorStrike`] holds the door open for a requested duration and locks it
//! again on its own. Requests that arrive while the door is open extend the
//! open interval instead of stacking a second one.
//!
//! # Architecture
//!
//! Two tasks connected by a one-way command channel:
//!
//! - the **timing loop** owns the single deadline timer. The first request
//!   arms it and sends `Open`; later requests re-arm it per the
//!   [`ExtendPolicy`]; expiry sends `Close`.
//! - the **actuation loop** owns the [`StrikeActuator`] and applies commands
//!   one at a time. It is the only writer of the output and halts the
//!   actuator on its way out.
//!
//! Callers never touch the actuator: [`DoorStrike::unlock`] only enqueues a
//! request for the timing loop.
//!
//! # Examples
//!
//! ```
//! use keyless_hardware::mock::MockActuator;
//! use keyless_hardware::strike::{DoorStrike, StrikeConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> keyless_hardware::Result<()> {
//!     let (actuator, _handle) = MockActuator::new();
//!     let mut strike = DoorStrike::new(actuator, StrikeConfig::default());
//!
//!     strike.unlock(Duration::from_secs(3)).await?;
//!
//!     strike.done().await;
//!     assert!(strike.unlock(Duration::from_secs(3)).await.is_err());
//!     Ok(())
//! }
//! ```

use crate::{HardwareError, Result, traits::StrikeActuator, types::StrikeOutput};
use keyless_core::constants::DEFAULT_STRIKE_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How a request received while the door is open moves the deadline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtendPolicy {
    /// The deadline becomes `now + duration`.
    #[default]
    Reset,

    /// The deadline moves `duration` past the current deadline.
    Additive,
}

/// Longest single open interval. Longer requests are clamped to it.
pub const MAX_OPEN_DURATION: Duration = Duration::from_secs(86_400 * 365 * 30);

impl ExtendPolicy {
    fn next_deadline(self, current: Option<Instant>, now: Instant, duration: Duration) -> Instant {
        let base = match (self, current) {
            (Self::Additive, Some(current)) => current.max(now),
            _ => now,
        };

        // Past the clock's range the deadline stays where it is.
        base.checked_add(duration.min(MAX_OPEN_DURATION)).unwrap_or(base)
    }
}

/// Strike tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeConfig {
    /// Deadline extension behaviour.
    pub extend_policy: ExtendPolicy,

    /// Capacity of the request and command channels.
    pub channel_capacity: usize,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            extend_policy: ExtendPolicy::default(),
            channel_capacity: DEFAULT_STRIKE_CHANNEL_CAPACITY,
        }
    }
}

/// Anything that can be asked to hold the door open.
pub trait StrikeControl: Send + Sync {
    /// Request the door to stay open for `duration`.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` after the strike has been torn down.
    fn unlock(&self, duration: Duration) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrikeCommand {
    Open,
    Close,
}

impl StrikeCommand {
    fn output(self) -> StrikeOutput {
        match self {
            Self::Open => StrikeOutput::Unlocked,
            Self::Close => StrikeOutput::Locked,
        }
    }
}

/// Cloneable requester for a running strike.
#[derive(Debug, Clone)]
pub struct StrikeHandle {
    requests: mpsc::Sender<Duration>,
    initialized: Arc<AtomicBool>,
}

impl StrikeHandle {
    /// Request the door to stay open for `duration`.
    ///
    /// Waits only for room in the request channel, never for actuator I/O.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` after the strike has been torn down.
    pub async fn unlock(&self, duration: Duration) -> Result<()> {
        if !self.is_initialized() {
            return Err(HardwareError::not_initialized("strike"));
        }

        self.requests
            .send(duration)
            .await
            .map_err(|_| HardwareError::not_initialized("strike"))
    }

    /// Whether the strike still accepts requests.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

impl StrikeControl for StrikeHandle {
    async fn unlock(&self, duration: Duration) -> Result<()> {
        StrikeHandle::unlock(self, duration).await
    }
}

/// Owner of the strike actuator and its two control loops.
#[derive(Debug)]
pub struct DoorStrike {
    handle: StrikeHandle,
    quit: CancellationToken,
    timing: Option<JoinHandle<()>>,
    actuation: Option<JoinHandle<()>>,
}

impl DoorStrike {
    /// Take ownership of an acquired actuator and spawn the control loops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<A: StrikeActuator + 'static>(actuator: A, config: StrikeConfig) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let quit = CancellationToken::new();

        let timing = tokio::spawn(timing_loop(
            request_rx,
            command_tx,
            config.extend_policy,
            quit.clone(),
        ));
        let actuation = tokio::spawn(actuation_loop(actuator, command_rx, quit.clone()));

        debug!(policy = ?config.extend_policy, "strike loops started");

        Self {
            handle: StrikeHandle {
                requests: request_tx,
                initialized: Arc::new(AtomicBool::new(true)),
            },
            quit,
            timing: Some(timing),
            actuation: Some(actuation),
        }
    }

    /// Request the door to stay open for `duration`.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` after [`done`](Self::done).
    pub async fn unlock(&self, duration: Duration) -> Result<()> {
        self.handle.unlock(duration).await
    }

    /// A cloneable requester sharing this strike.
    pub fn handle(&self) -> StrikeHandle {
        self.handle.clone()
    }

    /// Whether the strike still accepts requests.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_initialized()
    }

    /// Tear the strike down.
    ///
    /// Marks the strike uninitialized, stops both loops and waits for them to
    /// exit. The actuation loop halts the actuator exactly once on its way
    /// out. Later calls do nothing.
    pub async fn done(&mut self) {
        self.handle.initialized.store(false, Ordering::SeqCst);
        self.quit.cancel();

        let tasks = [self.timing.take(), self.actuation.take()];
        if tasks.iter().all(Option::is_none) {
            return;
        }

        for task in tasks.into_iter().flatten() {
            if let Err(e) = task.await {
                error!(error = %e, "strike task failed");
            }
        }

        info!("strike released");
    }
}

impl StrikeControl for DoorStrike {
    async fn unlock(&self, duration: Duration) -> Result<()> {
        DoorStrike::unlock(self, duration).await
    }
}

impl Drop for DoorStrike {
    fn drop(&mut self) {
        self.handle.initialized.store(false, Ordering::SeqCst);
        self.quit.cancel();
    }
}

async fn timing_loop(
    mut requests: mpsc::Receiver<Duration>,
    commands: mpsc::Sender<StrikeCommand>,
    policy: ExtendPolicy,
    quit: CancellationToken,
) {
    let timer = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(timer);
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            _ = quit.cancelled() => break,

            request = requests.recv() => {
                let Some(duration) = request else { break };

                let next = policy.next_deadline(deadline, Instant::now(), duration);
                timer.as_mut().reset(next);

                if deadline.is_none() && !command(&commands, StrikeCommand::Open, &quit).await {
                    break;
                }
                deadline = Some(next);
            }

            _ = &mut timer, if deadline.is_some() => {
                deadline = None;
                if !command(&commands, StrikeCommand::Close, &quit).await {
                    break;
                }
            }
        }
    }

    debug!("strike timing loop exited");
}

async fn command(
    commands: &mpsc::Sender<StrikeCommand>,
    command: StrikeCommand,
    quit: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = quit.cancelled() => false,
        sent = commands.send(command) => sent.is_ok(),
    }
}

async fn actuation_loop<A: StrikeActuator>(
    mut actuator: A,
    mut commands: mpsc::Receiver<StrikeCommand>,
    quit: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = quit.cancelled() => break,

            command = commands.recv() => match command {
                Some(command) => {
                    let output = command.output();
                    match actuator.drive(output).await {
                        Ok(()) => debug!(?output, "strike driven"),
                        Err(e) => error!(?output, error = %e, "failed to drive strike"),
                    }
                }
                None => break,
            },
        }
    }

    match actuator.halt().await {
        Ok(()) => debug!("strike halted"),
        Err(e) => error!(error = %e, "failed to halt strike"),
    }
}
