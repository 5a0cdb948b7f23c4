use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::render_loop::TickOutcome;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Render driver throughput over the last reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    /// Engine frames advanced per second.
    pub fps: f32,
    /// Render driver wake-ups per second, whatever the outcome.
    pub tps: f32,
    /// Mean time spent in a frame-advancing tick, gate wait included.
    pub frame_time_ms: f32,
    /// Ticks per second skipped because a video owned the screen.
    pub skipped_for_video: f32,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct TickAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    frames: u32,
    skipped_for_video: u32,
    frame_time_sum: Duration,
}

impl TickAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            frames: 0,
            skipped_for_video: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, outcome: TickOutcome, spent: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        match outcome {
            TickOutcome::Advanced | TickOutcome::Finished => {
                self.frames = self.frames.saturating_add(1);
                self.frame_time_sum = self.frame_time_sum.saturating_add(spent);
            }
            TickOutcome::VideoOwnsScreen => {
                self.skipped_for_video = self.skipped_for_video.saturating_add(1);
            }
            _ => {}
        }
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            self.frame_time_sum.as_secs_f32() * 1000.0 / self.frames as f32
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            skipped_for_video: self.skipped_for_video as f32 / seconds,
        };

        *self = Self::new(self.interval, now);
        Some(snapshot)
    }
}
