//! # PID corrector
//!
//! Closes the loop between the commanded speed and the speed measured by
//! odometry. The corrector's output is centred on the measured speed rather
//! than on zero, so it acts as a trim around the current feedback instead of
//! producing an absolute demand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID corrector
#[derive(Debug, Serialize, Clone)]
pub struct PidCorrector {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: f64,

    /// The integral accumulation. There is no windup limit on this term.
    integral: f64,

    /// The last computed derivative, kept for steps with no elapsed time
    deriv: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidCorrector {
    /// Create a new corrector with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            prev_error: 0f64,
            integral: 0f64,
            deriv: 0f64,
        }
    }

    /// Correct the target speed based on the measured speed.
    ///
    /// `dt_s` is the time elapsed between the two most recent odometry
    /// samples. If it is not positive the derivative from the previous step is
    /// reused.
    pub fn correct(&mut self, target_ms: f64, measured_ms: f64, dt_s: f64) -> f64 {
        let error = target_ms - measured_ms;

        self.integral += error * dt_s;

        if dt_s > 0.0 {
            self.deriv = (error - self.prev_error) / dt_s;
        }

        self.prev_error = error;

        self.k_p * error + self.k_i * self.integral + self.k_d * self.deriv + measured_ms
    }

    /// Clear the accumulated state, keeping the gains.
    pub fn reset(&mut self) {
        self.prev_error = 0f64;
        self.integral = 0f64;
        self.deriv = 0f64;
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The error from the previous step.
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}
