//! Engine-agnostic streaming statistics.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use stream_plugin::metrics::{StreamingMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! metrics.record_update_timing(timing_us);
//! metrics.record_round(fetched);
//! metrics.record_purge(purged);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Per-representation streaming statistics.
#[derive(Debug, Clone, Default)]
pub struct StreamingMetrics {
    /// Rolling window of re-prioritization times in microseconds.
    pub update_timings: RollingWindow<u64>,
    /// Rolling window of per-block geometry times in microseconds.
    pub geometry_timings: RollingWindow<u64>,

    /// Streaming rounds run.
    pub rounds: u64,
    /// Blocks fetched by streaming rounds.
    pub blocks_fetched: u64,
    /// Blocks removed from the render tree.
    pub blocks_purged: u64,
    /// Effective (non no-op) queue updates.
    pub reprioritizations: u64,
}

impl StreamingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset timings; counters are cumulative and kept.
    pub fn reset(&mut self) {
        self.update_timings.clear();
        self.geometry_timings.clear();
    }

    pub fn record_update_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.update_timings.push(timing_us);
            self.reprioritizations += 1;
        }
    }

    pub fn record_geometry_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.geometry_timings.push(timing_us);
        }
    }

    pub fn record_round(&mut self, fetched: usize) {
        if is_enabled() {
            self.rounds += 1;
            self.blocks_fetched += fetched as u64;
        }
    }

    pub fn record_purge(&mut self, purged: usize) {
        if is_enabled() {
            self.blocks_purged += purged as u64;
        }
    }

    pub fn avg_update_timing_us(&self) -> f64 {
        self.update_timings.average()
    }

    pub fn avg_geometry_timing_us(&self) -> f64 {
        self.geometry_timings.average()
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        // Push one more, oldest should be evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.min_max(), Some((20, 40)));
        assert_eq!(window.last(), Some(&40));
    }

    #[test]
    fn test_round_counters() {
        let mut metrics = StreamingMetrics::new();
        metrics.record_round(3);
        metrics.record_round(0);
        metrics.record_purge(2);
        metrics.record_update_timing(100);
        metrics.record_update_timing(300);

        assert_eq!(metrics.rounds, 2);
        assert_eq!(metrics.blocks_fetched, 3);
        assert_eq!(metrics.blocks_purged, 2);
        assert_eq!(metrics.reprioritizations, 2);
        assert_eq!(metrics.avg_update_timing_us(), 200.0);

        metrics.reset();
        assert!(metrics.update_timings.is_empty());
        assert_eq!(metrics.rounds, 2);
    }
}
