//! Parameters structure for VelCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::VelCtrlInitError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for velocity control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- SURFACE PROFILES ----
    /// Maximum speed given to a surface the first time it is seen.
    ///
    /// Units: meters/second
    pub default_max_speed_ms: f64,

    /// Maximum acceleration given to a surface the first time it is seen.
    ///
    /// Units: meters/second^2
    pub default_max_accel_mss: f64,

    /// Lowest value a surface's maximum speed can be ratcheted down to.
    ///
    /// Units: meters/second
    pub min_max_speed_ms: f64,

    // ---- VIBRATION ----
    /// Number of vertical acceleration samples in one vibration window.
    pub vibration_window_len: usize,

    /// Standard deviation of vertical acceleration above which the robot is
    /// considered to be vibrating too much.
    ///
    /// Units: meters/second^2
    pub vibration_threshold_mss: f64,

    /// Amount taken off the current speed when a surface's maximum speed is
    /// ratcheted down.
    ///
    /// Units: meters/second
    pub ratchet_margin_ms: f64,

    // ---- ANTICIPATION ----
    /// Ratio between successive roughness statistics above which the terrain
    /// ahead is considered rougher (or, inverted, smoother).
    pub roughness_ratio: f64,

    /// Distance ahead of the robot at which the roughness is measured.
    ///
    /// Units: meters
    pub lookahead_distance_m: f64,

    /// Speed cap applied while rougher terrain is anticipated.
    ///
    /// Units: meters/second
    pub anticipation_max_speed_ms: f64,

    // ---- COMMAND SHAPING ----
    /// Scale from the joystick axis to a speed demand. Negative because
    /// pushing the stick forward gives a negative axis value.
    ///
    /// Units: meters/second
    pub joy_axis_scale_ms: f64,

    /// Magnitude of the previous command above which the controller is
    /// considered to have failed.
    ///
    /// Units: meters/second
    pub anomaly_limit_ms: f64,

    // ---- PID ----
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            default_max_speed_ms: 2.0,
            default_max_accel_mss: 0.25,
            min_max_speed_ms: 0.05,
            vibration_window_len: 20,
            vibration_threshold_mss: 0.45,
            ratchet_margin_ms: 0.15,
            roughness_ratio: 1.75,
            lookahead_distance_m: 0.45,
            anticipation_max_speed_ms: 0.2,
            joy_axis_scale_ms: -2.0,
            anomaly_limit_ms: 2.0,
            k_p: 1.0,
            k_i: 0.001,
            k_d: 0.00001,
        }
    }
}

impl Params {
    /// Check the parameters are physically meaningful.
    pub fn validate(&self) -> Result<(), VelCtrlInitError> {
        let positive = [
            ("default_max_speed_ms", self.default_max_speed_ms),
            ("default_max_accel_mss", self.default_max_accel_mss),
            ("min_max_speed_ms", self.min_max_speed_ms),
            ("vibration_threshold_mss", self.vibration_threshold_mss),
            ("roughness_ratio", self.roughness_ratio),
            ("lookahead_distance_m", self.lookahead_distance_m),
            ("anticipation_max_speed_ms", self.anticipation_max_speed_ms),
            ("anomaly_limit_ms", self.anomaly_limit_ms),
        ];

        for &(name, value) in positive.iter() {
            if !(value.is_finite() && value > 0.0) {
                return Err(VelCtrlInitError::InvalidParam(
                    name,
                    format!("expected a positive value, found {}", value),
                ));
            }
        }

        if self.vibration_window_len < 2 {
            return Err(VelCtrlInitError::InvalidParam(
                "vibration_window_len",
                format!(
                    "at least 2 samples are needed, found {}",
                    self.vibration_window_len
                ),
            ));
        }

        if self.min_max_speed_ms > self.default_max_speed_ms {
            return Err(VelCtrlInitError::InvalidParam(
                "min_max_speed_ms",
                String::from("must not be larger than default_max_speed_ms"),
            ));
        }

        if self.default_max_speed_ms > self.anomaly_limit_ms {
            return Err(VelCtrlInitError::InvalidParam(
                "default_max_speed_ms",
                String::from("must not be larger than anomaly_limit_ms"),
            ));
        }

        Ok(())
    }
}
