use super::Backoff;

const DEFAULT_MAX_DELAY_MS: u64 = 12_000;

/// Exponential backoff with an integer multiplier ratio
/// (`multiplier / multiplier_base`) and a cap on any single delay.
///
/// # Example
///
/// ```
/// use altda_common::retry::policies::ExponentialBackoff;
///
/// // Starts at 200ms and doubles each retry: 200ms → 400ms → 800ms → ...
/// let backoff = ExponentialBackoff::new(200, 2, 1);
/// ```
pub struct ExponentialBackoff {
    /// Initial delay before the first retry, in milliseconds.
    base_delay_ms: u64,

    /// Numerator of the backoff multiplier (e.g., `150` for 1.5x).
    multiplier: u64,

    /// Denominator of the backoff multiplier (e.g., `100` for 1.5x).
    multiplier_base: u64,

    /// Upper bound on any single delay.
    max_delay_ms: u64,
}

impl ExponentialBackoff {
    pub fn new(base_delay_ms: u64, multiplier: u64, multiplier_base: u64) -> Self {
        assert!(multiplier_base != 0);
        Self {
            base_delay_ms,
            multiplier,
            multiplier_base,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        // One L1 slot is 12s, no point waiting much longer than that.
        Self {
            base_delay_ms: 200,
            multiplier: 2,
            multiplier_base: 1,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl Backoff for ExponentialBackoff {
    fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    fn next_delay_ms(&self, curr_delay_ms: u64) -> u64 {
        (curr_delay_ms.saturating_mul(self.multiplier) / self.multiplier_base).min(self.max_delay_ms)
    }
}
