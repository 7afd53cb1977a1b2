//! Restart and retry delays.

use std::time::Duration;

/// Delay policy for restarting a failed loop or retrying a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay every time.
    Fixed(Duration),
    /// `base * 2^attempt`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}
