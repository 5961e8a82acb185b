//! Exponential backoff schedule for chat retries.

use std::time::Duration;

/// Base delay used when the caller does not pick one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Delay after failed attempt number `attempt` (1-based): `base * 2^attempt`.
///
/// Saturates instead of overflowing for absurd attempt counts.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}
