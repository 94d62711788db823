//! Adaptive Batch Controller
//!
//! Adjusts the window size between retrievals to keep per-window latency
//! inside a configured band. The controller reacts to measured cost, not
//! to row counts, which is what keeps throughput stable over a
//! multi-hour run as retrieval depth grows.

use crate::config::WindowConfig;
use std::time::Duration;

/// Latency-band window sizing
///
/// Policy: latency above the high-water mark halves the window (floored
/// at `min_size`); latency below the low-water mark with room to grow
/// multiplies it by the growth factor (capped at `max_size`); anything
/// in between holds steady.
#[derive(Debug, Clone)]
pub struct AdaptiveWindow {
    min_size: usize,
    max_size: usize,
    high_water: Duration,
    low_water: Duration,
    growth_factor: f64,
}

impl AdaptiveWindow {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            min_size: config.min_size,
            max_size: config.max_size,
            high_water: Duration::from_millis(config.high_water_ms),
            low_water: Duration::from_millis(config.low_water_ms),
            growth_factor: config.growth_factor,
        }
    }

    /// Next window size given the last window's size and latency
    pub fn next_size(&self, last_size: usize, last_latency: Duration) -> usize {
        if last_latency > self.high_water {
            let halved = (last_size / 2).max(self.min_size);
            if halved < last_size {
                tracing::debug!(
                    from = last_size,
                    to = halved,
                    latency_ms = last_latency.as_millis() as u64,
                    "Window over latency budget, shrinking"
                );
            }
            halved
        } else if last_latency < self.low_water && last_size < self.max_size {
            let grown =
                ((last_size as f64 * self.growth_factor) as usize).min(self.max_size);
            tracing::debug!(
                from = last_size,
                to = grown,
                latency_ms = last_latency.as_millis() as u64,
                "Window under latency budget, growing"
            );
            grown
        } else {
            last_size
        }
    }
}
