//! Authorization dispatch loop.
//!
//! The [`Dispatcher`] drains scanner output, asks the [`Authorizer`] about
//! every identifier and unlocks the strike for granted badges. It fails
//! closed: a lookup error is a denial.

use keyless_core::BadgeId;
use keyless_hardware::{ScanEvent, ScanEvents, StrikeControl};
use keyless_store::Authorizer;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Counters reported when the dispatch loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Identifiers received from the scanner.
    pub scanned: u64,

    /// Identifiers the authorizer approved.
    pub granted: u64,

    /// Identifiers the authorizer rejected.
    pub denied: u64,

    /// Identifiers whose lookup failed (treated as denied).
    pub lookup_failures: u64,

    /// Errors received from the scanner.
    pub scanner_errors: u64,

    /// Approved identifiers the strike refused to unlock for.
    pub unlock_failures: u64,
}

/// Consumer of scanner events.
#[derive(Debug)]
pub struct Dispatcher<A, S> {
    authorizer: A,
    strike: S,
    grant_duration: Duration,
}

impl<A: Authorizer, S: StrikeControl> Dispatcher<A, S> {
    pub fn new(authorizer: A, strike: S, grant_duration: Duration) -> Self {
        Self {
            authorizer,
            strike,
            grant_duration,
        }
    }

    /// Process events until both scanner sequences end.
    ///
    /// Lookups are awaited inline, so a slow authorizer slows draining and
    /// the scanner's bounded channels push back on the polling loop.
    pub async fn run(self, mut events: ScanEvents) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Some(event) = events.recv().await {
            match event {
                ScanEvent::Identifier(id) => self.handle_identifier(id, &mut stats).await,
                ScanEvent::Error(e) => {
                    stats.scanner_errors += 1;
                    warn!(error = %e, "scanner error");
                }
            }
        }

        info!(
            scanned = stats.scanned,
            granted = stats.granted,
            denied = stats.denied,
            lookup_failures = stats.lookup_failures,
            scanner_errors = stats.scanner_errors,
            unlock_failures = stats.unlock_failures,
            "dispatcher stopped"
        );
        stats
    }

    /// Run the loop on its own task.
    pub fn spawn(self, events: ScanEvents) -> JoinHandle<DispatchStats>
    where
        A: 'static,
        S: 'static,
    {
        tokio::spawn(self.run(events))
    }

    async fn handle_identifier(&self, id: BadgeId, stats: &mut DispatchStats) {
        stats.scanned += 1;

        match self.authorizer.check(&id).await {
            Ok(true) => {
                stats.granted += 1;
                info!(badge_id = %id, "access granted");

                if let Err(e) = self.strike.unlock(self.grant_duration).await {
                    stats.unlock_failures += 1;
                    error!(badge_id = %id, error = %e, "failed to unlock strike");
                }
            }
            Ok(false) => {
                stats.denied += 1;
                info!(badge_id = %id, "access denied");
            }
            Err(e) => {
                stats.lookup_failures += 1;
                error!(badge_id = %id, error = %e, "access lookup failed, denying");
            }
        }
    }
}
