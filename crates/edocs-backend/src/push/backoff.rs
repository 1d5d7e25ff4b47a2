use std::time::Duration;

/// Exponential reconnect delay with an upper bound.
///
/// The n-th consecutive failure (starting at 1) waits
/// `min(initial * 2^(n-1), max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay to wait after `failures` consecutive failures.
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_from_initial_delay_until_capped() {
        let backoff = Backoff::new(Duration::from_secs(3), Duration::from_secs(60));
        let delays: Vec<u64> = (1..=7).map(|n| backoff.delay(n).as_secs()).collect();

        assert_eq!(delays, vec![3, 6, 12, 24, 48, 60, 60]);
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn zero_failures_uses_initial_delay() {
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(50));
        assert_eq!(backoff.delay(0), Duration::from_millis(10));
    }

    #[test]
    fn cap_below_initial_is_raised_to_initial() {
        let backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(backoff.delay(4), Duration::from_secs(5));
    }
}
