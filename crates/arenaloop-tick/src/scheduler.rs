//! The scheduler itself.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use crate::{TickConfig, TickPolicy};

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// `true` if this tick woke up noticeably late.
    pub overrun: bool,
    /// Ticks that were not fired because of the overrun policy.
    pub ticks_skipped: u64,
}

/// Runtime counters for one scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Ticks fired so far.
    pub total_ticks: u64,
    /// Late wakeups detected.
    pub total_overruns: u64,
    /// Ticks dropped by the overrun policy.
    pub total_skipped: u64,
    /// Duration of the most recent tick body.
    pub last_tick_time: Duration,
    /// Longest tick body observed.
    pub max_tick_time: Duration,
}

/// Something driven by a [`TickScheduler`], one call per fired tick.
pub trait Tickable {
    fn tick(&mut self);
}

/// Fixed-interval tick scheduler. One per arena actor.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick is due (Tokio instant for `sleep_until`).
    next_tick: TokioInstant,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a scheduler from config.
    ///
    /// The first tick is delayed by a random jitter bounded by
    /// `initial_jitter`.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        // Sub-microsecond jitter rounds down to none.
        let max_us = config.initial_jitter.as_micros() as u64;
        let jitter = if max_us == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rand::rng().random_range(0..max_us))
        };
        let next_tick = TokioInstant::now() + config.interval + jitter;

        debug!(
            interval_ms = config.interval.as_millis() as u64,
            policy = ?config.policy,
            paused = config.start_paused,
            "tick scheduler created"
        );

        Self {
            paused: config.start_paused,
            config,
            tick_count: 0,
            next_tick,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Scheduler ticking every `interval`, not paused, without jitter.
    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig {
            initial_jitter: Duration::ZERO,
            ..TickConfig::every(interval)
        })
    }

    /// Wait until the next tick is due.
    ///
    /// While paused this future never resolves; `tokio::select!` keeps
    /// serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
            unreachable!()
        }

        let due = self.next_tick;
        let interval = self.config.interval;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > interval / 10;
        let behind = (late_by.as_nanos() / interval.as_nanos()) as u64;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun && behind > 0 {
                    ticks_skipped = behind;
                    warn!(
                        tick = self.tick_count,
                        skipped = behind,
                        "arena tick overrun, skipping ahead"
                    );
                }
                now + interval
            }
            TickPolicy::CatchUp { max_catchup } => {
                let max = u64::from(max_catchup);
                if behind > max {
                    ticks_skipped = behind - max;
                    warn!(
                        tick = self.tick_count,
                        behind,
                        skipped = ticks_skipped,
                        "arena tick overrun beyond catch-up cap"
                    );
                    now + interval
                } else {
                    due + interval
                }
            }
            TickPolicy::Drop => {
                ticks_skipped = behind;
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_millis() as u64,
                        "arena tick overrun, keeping cadence"
                    );
                }
                due + interval * (behind as u32 + 1)
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Waits for the next tick, runs it on `target` and records the
    /// body time. Cancelling the future before the tick fires is safe.
    pub async fn drive<T: Tickable + ?Sized>(&mut self, target: &mut T) -> TickInfo {
        let info = self.wait_for_tick().await;
        target.tick();
        self.record_tick_end();
        info
    }

    /// Record that the tick body has finished.
    ///
    /// Feeds the metrics and warns when the body used more than the
    /// configured share of the interval.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.config.interval.as_secs_f64();

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "arena tick body is slow"
            );
        }

        self.metrics.last_tick_time = elapsed;
        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }
    }

    /// Stop firing ticks. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resume firing ticks; the next one is due one interval from now.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.config.interval;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// The configured interval between ticks.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
