//! # Velocity control module
//!
//! Velocity control turns the operator's joystick input into a forward speed
//! demand that is adapted to the terrain the robot is driving over.
//!
//! Each terrain type reported by the surface classifier gets its own profile
//! of maximum speed and acceleration. Profiles start at the default values and
//! are ratcheted down whenever the robot vibrates too much while speeding up on
//! that surface, so the controller learns how fast each surface can be driven.
//! Terrain which has not been classified shares a single scratch profile which
//! is promoted to a permanent one when the classifier first names the surface.
//!
//! Roughness statistics measured some distance ahead of the robot are used to
//! anticipate a change to rougher terrain, during which the speed is capped
//! until the robot has travelled the lookahead distance.
//!
//! On every joystick sample the demand is limited by the anticipation cap and
//! the surface profile, ramped to respect the surface's maximum acceleration,
//! and finally trimmed by a PID corrector around the measured speed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod anticipation;
mod params;
mod pid;
mod state;
mod surface;
mod vibration;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use anticipation::*;
pub use params::*;
pub use pid::*;
pub use state::*;
pub use surface::*;
pub use vibration::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during VelCtrl processing.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum VelCtrlError {
    #[error(
        "Previous commanded speed of {cmd_ms:.3} m/s exceeds the anomaly limit of {limit_ms:.3} \
        m/s, holding last safe command of {held_ms:.3} m/s"
    )]
    AnomalousVelocity {
        cmd_ms: f64,
        limit_ms: f64,
        held_ms: f64,
    },

    #[error("No profile exists for surface {0}")]
    UnknownSurface(i32),
}

/// Possible errors that can occur while initialising VelCtrl.
#[derive(Debug, thiserror::Error)]
pub enum VelCtrlInitError {
    #[error("Could not load the VelCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid VelCtrl parameter `{0}`: {1}")]
    InvalidParam(&'static str, String),
}
