//! # Fibonacci Backoff
//!
//! Provides a Fibonacci-based backoff mechanism for retries and polling.
//! This provides a progressive backoff that grows more slowly than exponential backoff,
//! making it suitable for operations that may need many attempts without overwhelming
//! the remote API.
//!
//! Two sequences are used by the controller:
//! - task polling: 500ms, 500ms, 1s, 1.5s, 2.5s, 4s, 5s (max)
//! - reconcile error requeue: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max)

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Generates backoff durations following the Fibonacci sequence, starting at `min`
/// and capped at `max`. Each backoff is the sum of the previous two backoffs.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff value (for reset)
    min: Duration,
    /// Previous backoff value
    prev: Duration,
    /// Current backoff value
    current: Duration,
    /// Maximum backoff value
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with specified minimum and maximum values
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum backoff duration (used for the first two values)
    /// * `max` - Maximum backoff duration (caps the sequence)
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.min(max);
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Backoff used by the reconcile error policy: 1 minute min, 10 minutes max
    #[must_use]
    pub fn for_requeue() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(600))
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;

        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);

        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::for_requeue();

        // Reconciliation error sequence in minutes: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max)
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(120));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(180));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(300));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(480));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(600));
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(Duration::from_millis(500), Duration::from_secs(5));

        let seq: Vec<u128> = (0..9).map(|_| backoff.next_backoff().as_millis()).collect();
        assert_eq!(seq, vec![500, 500, 1000, 1500, 2500, 4000, 5000, 5000, 5000]);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::for_requeue();

        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(120));

        backoff.reset();

        // Should restart from beginning after success
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_backoff_stays_zero() {
        let mut backoff = FibonacciBackoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.next_backoff(), Duration::ZERO);
        assert_eq!(backoff.next_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_min_above_max_is_clamped() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(10), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
    }
}
