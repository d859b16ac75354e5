//! Recognizer restart pacing - debounce for natural restarts, backoff for failures

use std::time::{Duration, Instant};

use crate::config::{RestartConfig, RetryConfig};

/// Bounded exponential backoff for transient recognizer failures
#[derive(Debug, Clone)]
pub struct RetryBudget {
    max_retries: u32,
    base: Duration,
    cap: Duration,
    attempts: u32,
}

impl RetryBudget {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: Duration::from_millis(config.base_delay_ms),
            cap: Duration::from_millis(config.max_delay_ms),
            attempts: 0,
        }
    }

    /// Delay before the next retry, or None once the budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_retries {
            return None;
        }
        let factor = 1u32.checked_shl(self.attempts).unwrap_or(u32::MAX);
        self.attempts += 1;
        Some(self.base.saturating_mul(factor).min(self.cap))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called after a successful start
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// Minimum spacing between recognizer starts
#[derive(Debug, Clone)]
pub struct RestartGate {
    min_interval: Duration,
    last_start: Option<Instant>,
}

impl RestartGate {
    pub fn new(config: &RestartConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            last_start: None,
        }
    }

    /// Earliest instant a restart may happen, at or after `now`
    pub fn earliest(&self, now: Instant) -> Instant {
        match self.last_start {
            Some(last) => (last + self.min_interval).max(now),
            None => now,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_start = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut budget = RetryBudget::new(&RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        });
        let delays: Vec<u64> = std::iter::from_fn(|| budget.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn test_budget_exhausts_and_resets() {
        let mut budget = RetryBudget::new(&RetryConfig::default());
        assert!(budget.next_delay().is_some());
        assert!(budget.next_delay().is_some());
        assert!(budget.next_delay().is_some());
        assert!(budget.next_delay().is_none());
        assert_eq!(budget.attempts(), 3);
        budget.reset();
        assert_eq!(budget.next_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_gate_spacing() {
        let mut gate = RestartGate::new(&RestartConfig::default());
        let t0 = Instant::now();
        assert_eq!(gate.earliest(t0), t0);
        gate.record(t0);
        assert_eq!(gate.earliest(t0), t0 + Duration::from_millis(1000));
        let later = t0 + Duration::from_secs(5);
        assert_eq!(gate.earliest(later), later);
    }
}
