//! # Vibration monitor
//!
//! Collects vertical acceleration samples into non-overlapping windows and
//! reports the spread of each full window.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vibration monitor state
#[derive(Debug, Clone)]
pub struct VibrationMonitor {
    /// Samples in the current window
    window: Vec<f64>,

    /// Number of samples in a full window
    window_len: usize,

    /// Standard deviation above which a window is too rough
    ///
    /// Units: meters/second^2
    threshold_mss: f64,
}

/// Result of evaluating one full window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VibrationWindow {
    /// Standard deviation of the vertical acceleration over the window.
    ///
    /// Units: meters/second^2
    pub std_dev_mss: f64,

    /// True if the standard deviation is over the threshold.
    pub over_threshold: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VibrationMonitor {
    pub fn new(window_len: usize, threshold_mss: f64) -> Self {
        Self {
            window: Vec::with_capacity(window_len),
            window_len,
            threshold_mss,
        }
    }

    /// Add a vertical acceleration sample.
    ///
    /// When the sample completes a window the window is evaluated and cleared,
    /// and the result returned.
    pub fn observe(&mut self, z_accel_mss: f64) -> Option<VibrationWindow> {
        self.window.push(z_accel_mss);

        if self.window.len() < self.window_len {
            return None;
        }

        let std_dev_mss = util::maths::std_dev(&self.window);
        self.window.clear();

        std_dev_mss.map(|sd| VibrationWindow {
            std_dev_mss: sd,
            over_threshold: sd > self.threshold_mss,
        })
    }

    /// Number of samples collected towards the next window.
    pub fn num_pending(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_window_evaluated_when_full() {
        let mut mon = VibrationMonitor::new(4, 0.45);

        assert_eq!(mon.observe(1.0), None);
        assert_eq!(mon.observe(1.0), None);
        assert_eq!(mon.observe(1.0), None);
        assert_eq!(mon.num_pending(), 3);

        let w = mon.observe(1.0).unwrap();
        assert!(w.std_dev_mss.abs() < 1e-12);
        assert!(!w.over_threshold);

        // Windows do not overlap
        assert_eq!(mon.num_pending(), 0);
    }

    #[test]
    fn test_rough_window() {
        let mut mon = VibrationMonitor::new(20, 0.45);

        let mut result = None;
        for i in 0..20 {
            // Alternating +-1 about gravity has a std dev of exactly 1
            let z = if i % 2 == 0 { 10.81 } else { 8.81 };
            result = mon.observe(z);
        }

        let w = result.unwrap();
        assert!((w.std_dev_mss - 1.0).abs() < 1e-9);
        assert!(w.over_threshold);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut mon = VibrationMonitor::new(2, 0.5);

        // Two samples 1.0 apart have a population std dev of 0.5
        mon.observe(0.0);
        let w = mon.observe(1.0).unwrap();
        assert_eq!(w.std_dev_mss, 0.5);
        assert!(!w.over_threshold);
    }
}
