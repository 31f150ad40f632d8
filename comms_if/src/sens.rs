//! # Sensor events
//!
//! Every input to the velocity controller arrives as one of the [`SensEvent`] variants. Events
//! are serialised as JSON objects tagged by a `"type"` field, for example:
//!
//! ```text
//! {"type": "JOY", "axis": -0.5, "deadman": true, "stamp_s": 12.30}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Surface ID reported by the classifier when it cannot identify the terrain.
///
/// Any negative ID is treated as unknown.
pub const UNKNOWN_SURFACE_ID: i32 = -1;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An event from one of the robot's sensors or from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensEvent {
    /// The terrain classifier has reported the surface currently under the robot.
    Surface {
        /// Surface identifier, negative for unknown terrain.
        id: i32,
    },

    /// A new roughness statistic for the terrain ahead of the robot.
    Roughness {
        /// The roughness value, typically the standard deviation of vertical acceleration.
        value: f64,
    },

    /// A single IMU sample.
    Imu {
        /// Vertical (Z) linear acceleration.
        ///
        /// Units: meters/second^2
        z_accel_mss: f64,
    },

    /// A filtered odometry sample.
    Odom {
        /// Measured forward velocity of the robot body.
        ///
        /// Units: meters/second
        speed_ms: f64,

        /// Timestamp of the sample.
        ///
        /// Units: seconds
        stamp_s: f64,

        /// Forward position of the robot in the odometry frame.
        ///
        /// Units: meters
        pos_x_m: f64,
    },

    /// An operator joystick sample.
    Joy {
        /// Forward axis value in the range [-1, 1]. Pushing the stick forward gives negative
        /// values.
        axis: f64,

        /// True if the deadman button is held.
        deadman: bool,

        /// Timestamp of the sample.
        ///
        /// Units: seconds
        stamp_s: f64,
    },
}

/// Errors that can occur while parsing a sensor event.
#[derive(Debug, Error)]
pub enum SensParseError {
    #[error("Event contains invalid JSON or is not a recognised event: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Event field {0} is not a finite number")]
    NonFinite(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensEvent {
    /// Parse an event from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, SensParseError> {
        let event: SensEvent =
            serde_json::from_str(json_str).map_err(SensParseError::InvalidJson)?;

        event.validate()?;

        Ok(event)
    }

    /// Short name of the event type, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SensEvent::Surface { .. } => "SURFACE",
            SensEvent::Roughness { .. } => "ROUGHNESS",
            SensEvent::Imu { .. } => "IMU",
            SensEvent::Odom { .. } => "ODOM",
            SensEvent::Joy { .. } => "JOY",
        }
    }

    /// Check that all floating point fields are finite.
    fn validate(&self) -> Result<(), SensParseError> {
        let fields: Vec<(&'static str, f64)> = match *self {
            SensEvent::Surface { .. } => vec![],
            SensEvent::Roughness { value } => vec![("value", value)],
            SensEvent::Imu { z_accel_mss } => vec![("z_accel_mss", z_accel_mss)],
            SensEvent::Odom {
                speed_ms,
                stamp_s,
                pos_x_m,
            } => vec![
                ("speed_ms", speed_ms),
                ("stamp_s", stamp_s),
                ("pos_x_m", pos_x_m),
            ],
            SensEvent::Joy { axis, stamp_s, .. } => vec![("axis", axis), ("stamp_s", stamp_s)],
        };

        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SensParseError::NonFinite(name));
            }
        }

        Ok(())
    }
}
