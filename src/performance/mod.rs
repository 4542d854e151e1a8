//! # Frame timing
//!
//! Rolling frame-time statistics for the viewer loop. Metrics are recomputed
//! a few times per second and written to the `log` facade at debug level
//! once per report interval.
//!
//! ## Usage
//!
//! ```rust
//! use vantage::performance::PerformanceMonitor;
//!
//! let mut monitor = PerformanceMonitor::new();
//!
//! // In your main loop
//! monitor.begin_frame();
//! // ... render frame ...
//! monitor.end_frame();
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::gfx::rendering::FrameStats;

/// Frame metrics over the current sample window
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    /// Current frames per second
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Minimum frame time in the current window
    pub min_frame_time_ms: f32,
    /// Maximum frame time in the current window
    pub max_frame_time_ms: f32,
    /// Draw calls issued by the last frame
    pub draw_calls: usize,
    /// Vertices submitted by the last frame
    pub vertex_count: usize,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: f32::MAX,
            max_frame_time_ms: 0.0,
            draw_calls: 0,
            vertex_count: 0,
        }
    }
}

pub struct PerformanceMonitor {
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frame_start: Option<Instant>,
    current_metrics: PerformanceMetrics,
    last_update: Instant,
    update_interval: Duration,
    last_report: Instant,
    report_interval: Duration,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_config(120)
    }

    /// Monitor averaging over the last `max_samples` frames
    pub fn with_config(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
            frame_start: None,
            current_metrics: PerformanceMetrics::default(),
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
            last_report: Instant::now(),
            report_interval: Duration::from_secs(1),
        }
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Mark the end of a frame and update metrics
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.add_frame_time(start.elapsed());

            if self.last_update.elapsed() >= self.update_interval {
                self.update_metrics();
                self.last_update = Instant::now();
            }
            if self.last_report.elapsed() >= self.report_interval {
                self.report();
                self.last_report = Instant::now();
            }
        }
    }

    /// Add a frame time sample
    pub fn add_frame_time(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
    }

    /// Recomputes averages from the sample window.
    pub fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total_time / self.frame_times.len() as u32;
        let avg_frame_time_ms = avg_frame_time.as_secs_f32() * 1000.0;

        self.current_metrics.frame_time_ms = avg_frame_time_ms;
        self.current_metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current_metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    pub fn update_render_stats(&mut self, stats: &FrameStats) {
        self.current_metrics.draw_calls = stats.draw_calls;
        self.current_metrics.vertex_count = stats.vertices_submitted;
    }

    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    /// Frame times in the window, oldest first, in milliseconds
    pub fn get_frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.current_metrics = PerformanceMetrics::default();
        self.frame_start = None;
        self.last_update = Instant::now();
        self.last_report = Instant::now();
    }

    fn report(&self) {
        let metrics = &self.current_metrics;
        log::debug!(
            "{:.1} fps, frame {:.2}ms (min {:.2}ms, max {:.2}ms), {} draw calls, {} vertices",
            metrics.fps,
            metrics.frame_time_ms,
            metrics.min_frame_time_ms,
            metrics.max_frame_time_ms,
            metrics.draw_calls,
            metrics.vertex_count
        );
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_averages_over_window() {
        let mut monitor = PerformanceMonitor::with_config(4);
        for ms in [10, 20, 30, 40] {
            monitor.add_frame_time(Duration::from_millis(ms));
        }
        monitor.update_metrics();

        let metrics = monitor.get_metrics();
        assert_abs_diff_eq!(metrics.frame_time_ms, 25.0, epsilon = 1e-3);
        assert_abs_diff_eq!(metrics.fps, 40.0, epsilon = 1e-2);
        assert_abs_diff_eq!(metrics.min_frame_time_ms, 10.0, epsilon = 1e-3);
        assert_abs_diff_eq!(metrics.max_frame_time_ms, 40.0, epsilon = 1e-3);
    }

    #[test]
    fn test_window_drops_oldest_samples() {
        let mut monitor = PerformanceMonitor::with_config(2);
        for ms in [100, 10, 10] {
            monitor.add_frame_time(Duration::from_millis(ms));
        }
        assert_eq!(monitor.get_frame_time_history().len(), 2);
        monitor.update_metrics();
        assert_abs_diff_eq!(monitor.get_metrics().max_frame_time_ms, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_render_stats_and_reset() {
        let mut monitor = PerformanceMonitor::new();
        monitor.update_render_stats(&FrameStats {
            objects_drawn: 2,
            draw_calls: 3,
            vertices_submitted: 108,
        });
        assert_eq!(monitor.get_metrics().draw_calls, 3);
        assert_eq!(monitor.get_metrics().vertex_count, 108);

        monitor.add_frame_time(Duration::from_millis(16));
        monitor.reset();
        assert!(monitor.get_frame_time_history().is_empty());
        assert_eq!(monitor.get_metrics(), &PerformanceMetrics::default());
    }

    #[test]
    fn test_end_frame_without_begin_is_ignored() {
        let mut monitor = PerformanceMonitor::new();
        monitor.end_frame();
        assert!(monitor.get_frame_time_history().is_empty());
    }
}
