//! Defaults shared by the controller components.
//!
//! These values match the behaviour of the reference deployment: a strike
//! held open for three seconds per granted badge, and scanner channels deep
//! enough to absorb a burst of reads while an authorization lookup is in
//! flight.
//!
//! ```
//! use keyless_core::constants::*;
//! use std::time::Duration;
//!
//! let grant = Duration::from_millis(DEFAULT_GRANT_DURATION_MS);
//! assert_eq!(grant, Duration::from_secs(3));
//! ```

/// Capacity of each scanner output channel (identifiers and errors).
///
/// When the dispatcher falls behind, the polling task blocks on send
/// instead of dropping reads.
pub const DEFAULT_SCAN_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the strike request and command channels.
pub const DEFAULT_STRIKE_CHANNEL_CAPACITY: usize = 100;

/// How long a granted badge holds the strike open, in milliseconds.
pub const DEFAULT_GRANT_DURATION_MS: u64 = 3000;

/// Pause between empty polls, in milliseconds. Zero means busy-poll.
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 0;

/// Longest accepted badge id, in hex characters (a 10-byte ISO 14443 UID
/// is 20 characters; HID feature reports are 8 bytes).
pub const MAX_BADGE_ID_LENGTH: usize = 64;
