//! # Bumpiness anticipation tracker
//!
//! Roughness statistics describe the terrain some lookahead distance in front
//! of the robot. A sudden jump in roughness means the robot is about to drive
//! onto rougher (or smoother) terrain. Once such a change is flagged, the
//! tracker records where the robot was and keeps the flag raised until the
//! robot has travelled the lookahead distance, by which point it has reached
//! the new terrain.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Anticipation state
#[derive(Debug, Clone, Serialize)]
pub struct BumpinessTracker {
    previous_roughness: f64,
    current_roughness: f64,

    /// The terrain ahead is considerably rougher than the current terrain
    anticipating_rougher: bool,

    /// The terrain ahead is considerably smoother than the current terrain
    anticipating_smoother: bool,

    /// Position at which the current anticipation window was opened
    ///
    /// Units: meters
    transition_start_m: Option<f64>,

    /// Ratio between successive roughness values which flags a change
    roughness_ratio: f64,

    /// Distance to travel before the anticipated terrain is reached
    ///
    /// Units: meters
    lookahead_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Change to the anticipation window caused by a position sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowChange {
    None,
    Opened,
    Closed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BumpinessTracker {
    pub fn new(roughness_ratio: f64, lookahead_m: f64) -> Self {
        Self {
            previous_roughness: 0.0,
            current_roughness: 0.0,
            anticipating_rougher: false,
            anticipating_smoother: false,
            transition_start_m: None,
            roughness_ratio,
            lookahead_m,
        }
    }

    /// Add a roughness statistic for the terrain ahead.
    ///
    /// The rougher and smoother checks are independent, and both latch: they
    /// are only cleared once the robot has travelled through the window.
    pub fn on_roughness_sample(&mut self, value: f64) {
        self.previous_roughness = self.current_roughness;
        self.current_roughness = value;

        // A zero previous value means there's nothing to compare against yet
        if self.previous_roughness == 0.0 {
            return;
        }

        if self.current_roughness > self.previous_roughness * self.roughness_ratio {
            self.anticipating_rougher = true;
        }

        if self.current_roughness < self.previous_roughness / self.roughness_ratio {
            self.anticipating_smoother = true;
        }
    }

    /// Add a forward position sample.
    pub fn on_position_sample(&mut self, pos_x_m: f64) -> WindowChange {
        let mut change = WindowChange::None;

        if self.is_anticipating() && self.transition_start_m.is_none() {
            self.transition_start_m = Some(pos_x_m);
            change = WindowChange::Opened;
        }

        if let Some(start_m) = self.transition_start_m {
            if (pos_x_m - start_m).abs() >= self.lookahead_m {
                self.anticipating_rougher = false;
                self.anticipating_smoother = false;
                self.transition_start_m = None;
                change = WindowChange::Closed;
            }
        }

        change
    }

    pub fn is_anticipating_rougher(&self) -> bool {
        self.anticipating_rougher
    }

    pub fn is_anticipating_smoother(&self) -> bool {
        self.anticipating_smoother
    }

    /// True if either a rougher or a smoother surface is anticipated.
    pub fn is_anticipating(&self) -> bool {
        self.anticipating_rougher || self.anticipating_smoother
    }

    pub fn transition_start_m(&self) -> Option<f64> {
        self.transition_start_m
    }

    pub fn current_roughness(&self) -> f64 {
        self.current_roughness
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tracker() -> BumpinessTracker {
        BumpinessTracker::new(1.75, 0.45)
    }

    #[test]
    fn test_rougher_latches() {
        let mut t = tracker();
        t.on_roughness_sample(0.1);
        assert!(!t.is_anticipating());

        t.on_roughness_sample(0.3);
        assert!(t.is_anticipating_rougher());
        assert!(!t.is_anticipating_smoother());

        // Stays latched even once the roughness settles
        t.on_roughness_sample(0.3);
        assert!(t.is_anticipating_rougher());
    }

    #[test]
    fn test_smoother_latches() {
        let mut t = tracker();
        t.on_roughness_sample(0.4);
        t.on_roughness_sample(0.2);
        assert!(t.is_anticipating_smoother());
        assert!(!t.is_anticipating_rougher());
    }

    #[test]
    fn test_small_change_ignored() {
        let mut t = tracker();
        t.on_roughness_sample(0.2);
        t.on_roughness_sample(0.3);
        t.on_roughness_sample(0.2);
        assert!(!t.is_anticipating());
    }

    #[test]
    fn test_zero_previous_ignored() {
        let mut t = tracker();
        t.on_roughness_sample(0.0);
        t.on_roughness_sample(5.0);
        assert!(!t.is_anticipating());
    }

    #[test]
    fn test_both_flags_can_latch() {
        let mut t = tracker();
        t.on_roughness_sample(0.1);
        t.on_roughness_sample(0.5);
        t.on_roughness_sample(0.1);
        assert!(t.is_anticipating_rougher());
        assert!(t.is_anticipating_smoother());
    }

    #[test]
    fn test_no_window_without_anticipation() {
        let mut t = tracker();
        assert_eq!(t.on_position_sample(1.0), WindowChange::None);
        assert_eq!(t.transition_start_m(), None);
    }

    #[test]
    fn test_window_closes_at_lookahead() {
        let mut t = tracker();
        t.on_roughness_sample(0.1);
        t.on_roughness_sample(0.3);

        assert_eq!(t.on_position_sample(2.0), WindowChange::Opened);
        assert_eq!(t.transition_start_m(), Some(2.0));

        // Never before the lookahead distance
        for x in [2.1, 2.25, 2.4, 2.44].iter() {
            assert_eq!(t.on_position_sample(*x), WindowChange::None);
            assert!(t.is_anticipating_rougher());
        }

        assert_eq!(t.on_position_sample(2.5), WindowChange::Closed);
        assert!(!t.is_anticipating());
        assert_eq!(t.transition_start_m(), None);
    }

    #[test]
    fn test_window_closes_reversing() {
        let mut t = tracker();
        t.on_roughness_sample(0.4);
        t.on_roughness_sample(0.1);

        t.on_position_sample(0.0);
        assert_eq!(t.on_position_sample(-0.2), WindowChange::None);
        assert_eq!(t.on_position_sample(-0.5), WindowChange::Closed);
        assert!(!t.is_anticipating_smoother());
    }

    #[test]
    fn test_window_starting_at_origin() {
        let mut t = tracker();
        t.on_roughness_sample(0.1);
        t.on_roughness_sample(0.3);

        // A window opened at x = 0 is still a valid window
        assert_eq!(t.on_position_sample(0.0), WindowChange::Opened);
        assert_eq!(t.on_position_sample(0.3), WindowChange::None);
        assert_eq!(t.on_position_sample(0.45), WindowChange::Closed);
    }
}
