//! Progress reporting for long catalog decodes.
//!
//! The decoder only reports byte offsets. Deciding whether anything gets
//! printed is up to the observer, so decoding stays free of clock reads.

use std::time::{Duration, Instant};
use tracing::info;

pub trait ProgressObserver {
    fn observe(&mut self, bytes_consumed: u64, total_bytes: u64);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64, u64),
{
    fn observe(&mut self, bytes_consumed: u64, total_bytes: u64) {
        self(bytes_consumed, total_bytes)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn observe(&mut self, _bytes_consumed: u64, _total_bytes: u64) {}
}

pub fn percent(bytes_consumed: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 100.0;
    }
    bytes_consumed as f64 / total_bytes as f64 * 100.0
}

#[derive(Debug, Clone)]
pub struct LogProgress {
    interval: Duration,
    last: Instant,
}

impl LogProgress {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub fn tick(&mut self, now: Instant, bytes_consumed: u64, total_bytes: u64) -> Option<f64> {
        if now.saturating_duration_since(self.last) <= self.interval {
            return None;
        }
        self.last = now;
        Some(percent(bytes_consumed, total_bytes))
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgress {
    fn observe(&mut self, bytes_consumed: u64, total_bytes: u64) {
        if let Some(p) = self.tick(Instant::now(), bytes_consumed, total_bytes) {
            info!("{p:.0} percent");
        }
    }
}
