//! # Velocity Executable Parameters
//!
//! This module provide parameters for the velocity control executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelExecParams {
    /// Directory, relative to the software root, in which sessions are created
    pub sessions_dir: String,

    /// Minimum level of log records, one of `info`, `debug` or `trace`
    pub log_level: String,

    /// Level of log records from velocity control, which logs every tick at `trace`
    pub vel_ctrl_log_level: String,

    /// VelCtrl parameter file, relative to the params directory
    pub vel_ctrl_params: String,

    /// Number of events which can be queued between the event source and the main loop before the
    /// source blocks
    pub event_channel_bound: usize,

    /// Time without any event after which the event source is considered lost
    ///
    /// Units: seconds
    pub event_timeout_s: f64,
}

impl Default for VelExecParams {
    fn default() -> Self {
        Self {
            sessions_dir: String::from("sessions"),
            log_level: String::from("debug"),
            vel_ctrl_log_level: String::from("debug"),
            vel_ctrl_params: String::from("vel_ctrl.toml"),
            event_channel_bound: 64,
            event_timeout_s: 1.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VelExecParamsError {
    #[error("Invalid exec parameter `{0}`: {1}")]
    InvalidParam(&'static str, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelExecParams {
    /// Check the parameters can be used to run the executable.
    pub fn validate(&self) -> Result<(), VelExecParamsError> {
        self.event_timeout()?;

        if self.vel_ctrl_params.trim().is_empty() {
            return Err(VelExecParamsError::InvalidParam(
                "vel_ctrl_params",
                String::from("no VelCtrl parameter file given"),
            ));
        }

        Ok(())
    }

    /// The event timeout as a `Duration`.
    pub fn event_timeout(&self) -> Result<Duration, VelExecParamsError> {
        let invalid = || {
            VelExecParamsError::InvalidParam(
                "event_timeout_s",
                format!("expected a positive value, found {}", self.event_timeout_s),
            )
        };

        if !(self.event_timeout_s.is_finite() && self.event_timeout_s > 0.0) {
            return Err(invalid());
        }

        Duration::try_from_secs_f64(self.event_timeout_s).map_err(|_| invalid())
    }
}
