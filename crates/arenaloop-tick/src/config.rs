//! Scheduler configuration.

use std::time::Duration;

use tracing::warn;

/// What to do when the arena tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, at most `max_catchup` of them.
    ///
    /// Keeps countdowns close to wall-clock time after a short stall.
    CatchUp {
        /// Upper bound on back-to-back ticks after a stall.
        max_catchup: u32,
    },
    /// Keep the original cadence; late ticks are not compensated.
    Drop,
}

/// Configuration for a [`TickScheduler`](crate::TickScheduler).
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between two ticks. One second of game time by default.
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Fraction of the interval (0.0–1.0) above which a tick body is
    /// reported as slow.
    pub budget_warn_threshold: f64,
    /// Upper bound for the random delay added to the first tick so that
    /// arenas loaded together do not tick in lockstep.
    pub initial_jitter: Duration,
    /// Whether the scheduler starts paused.
    pub start_paused: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            initial_jitter: Duration::from_millis(50),
            start_paused: false,
        }
    }
}

impl TickConfig {
    /// Shortest interval accepted by the scheduler.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// Config with the given interval and defaults for everything else.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called by [`TickScheduler::new`](crate::TickScheduler::new).
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "tick interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        if self.initial_jitter >= self.interval {
            self.initial_jitter = self.interval / 2;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ticks_once_per_second() {
        let cfg = TickConfig::default();
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert_eq!(cfg.policy, TickPolicy::Skip);
        assert!(!cfg.start_paused);
    }

    #[test]
    fn test_validated_clamps_tiny_interval() {
        let cfg = TickConfig::every(Duration::from_millis(1)).validated();
        assert_eq!(cfg.interval, TickConfig::MIN_INTERVAL);
    }

    #[test]
    fn test_validated_bounds_jitter_and_threshold() {
        let cfg = TickConfig {
            interval: Duration::from_millis(100),
            initial_jitter: Duration::from_secs(5),
            budget_warn_threshold: 3.0,
            ..TickConfig::default()
        }
        .validated();
        assert_eq!(cfg.initial_jitter, Duration::from_millis(50));
        assert_eq!(cfg.budget_warn_threshold, 1.0);
    }
}
