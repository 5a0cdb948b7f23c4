use std::time::{Duration, Instant};

use bridge::{MediaBackend, MediaSource, MediaSourceError, PlaybackHandle};
use tracing::debug;

/// Media backend that does not decode anything: every source "plays" for a
/// fixed wall-clock duration.
pub(crate) struct ClockMedia {
    duration: Duration,
}

impl ClockMedia {
    pub(crate) fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl MediaBackend for ClockMedia {
    fn prepare(&self, source: MediaSource) -> Result<Box<dyn PlaybackHandle>, MediaSourceError> {
        if source.bytes.is_empty() {
            return Err(MediaSourceError::Prepare {
                name: source.name,
                message: "empty media file".to_string(),
            });
        }
        debug!(name = %source.name, bytes = source.bytes.len(), "clock_media_prepared");
        Ok(Box::new(ClockPlayer {
            duration: self.duration,
            started_at: None,
            stopped: false,
        }))
    }
}

struct ClockPlayer {
    duration: Duration,
    started_at: Option<Instant>,
    stopped: bool,
}

impl ClockPlayer {
    fn elapsed(&self) -> Duration {
        self.started_at
            .map_or(Duration::ZERO, |started| started.elapsed())
    }
}

impl PlaybackHandle for ClockPlayer {
    fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    fn position_ms(&self) -> u64 {
        self.elapsed().min(self.duration).as_millis() as u64
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some() && !self.stopped && self.elapsed() < self.duration
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn release(&mut self) {
        self.started_at = None;
    }
}
