//! Capped exponential backoff for deferred map updates.
//!
//! The widget's style assets load asynchronously and arbitrarily late; data
//! writes issued before that are deferred and retried with these delays
//! instead of being dropped.

use std::time::Duration;

/// Tunable parameters for the retry delays.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each retry.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next delay from the current one.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = BackoffConfig::default();
        let d = next_delay(Duration::from_millis(500), &config);
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = BackoffConfig {
            max_delay: Duration::from_secs(3),
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(2), &config);
        assert_eq!(d, Duration::from_secs(3));
    }

    #[test]
    fn next_delay_already_at_max() {
        let config = BackoffConfig::default();
        let d = next_delay(Duration::from_secs(5), &config);
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = BackoffConfig::default();
        let mut delay = config.initial_delay;
        let expected_ms = [500, 1000, 2000, 4000, 5000, 5000];

        for &expected in &expected_ms {
            assert_eq!(delay.as_millis(), expected);
            delay = next_delay(delay, &config);
        }
    }
}
