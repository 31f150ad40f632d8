//! # Data Store

use comms_if::{dems::VelDems, sens::SensEvent};
use log::{info, warn};

use crate::vel_ctrl::{self, VelCtrl, VelCtrlError};
use util::module::State;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    VelocityAnomaly,
    EventSourceLost,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Event management
    /// Number of events already processed
    pub num_events: u64,

    /// Number of demands issued
    pub num_dems: u64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // VelCtrl
    pub vel_ctrl: VelCtrl,
    pub vel_ctrl_output: Option<VelDems>,
    pub vel_ctrl_status_rpt: vel_ctrl::StatusReport,

    // Monitoring Counters
    /// Total number of velocity anomalies raised by VelCtrl
    pub num_velocity_anomalies: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the robot into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Make vel_ctrl safe
            self.vel_ctrl.make_safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of processing an event.
    ///
    /// Clears those items that need clearing for each event.
    pub fn event_start(&mut self) {
        self.vel_ctrl_output = None;
        self.vel_ctrl_status_rpt = vel_ctrl::StatusReport::default();
        self.num_events += 1;
    }

    /// Process a single sensor event, returning the demand to send to the actuator if there is one.
    ///
    /// In safe mode all events except joystick samples still reach VelCtrl so that surface
    /// learning and odometry keep up with the robot. Joystick samples with the deadman held give a
    /// stop demand instead, and releasing the deadman clears a velocity anomaly.
    pub fn process(&mut self, event: &SensEvent) -> Option<VelDems> {
        self.event_start();

        if self.safe {
            if let SensEvent::Joy { deadman, .. } = *event {
                if deadman {
                    self.vel_ctrl_output = Some(VelDems::stop());
                    self.num_dems += 1;
                } else if self.make_unsafe(SafeModeCause::VelocityAnomaly).is_ok() {
                    info!("Deadman released, VelCtrl re-armed");
                }
                return self.vel_ctrl_output;
            }
        }

        match self.vel_ctrl.proc(event) {
            Ok((o, r)) => {
                self.vel_ctrl_output = o;
                self.vel_ctrl_status_rpt = r;
            }
            Err(VelCtrlError::AnomalousVelocity { held_ms, .. }) => {
                // VelCtrl has already logged the anomaly, issue the held command for this tick
                // then stop until the operator re-arms
                self.num_velocity_anomalies += 1;
                self.vel_ctrl_status_rpt = *self.vel_ctrl.report();
                self.vel_ctrl_output = Some(VelDems { speed_ms: held_ms });
                self.make_safe(SafeModeCause::VelocityAnomaly);
            }
            Err(e) => warn!("Error during VelCtrl processing: {}", e),
        }

        if self.vel_ctrl_output.is_some() {
            self.num_dems += 1;
        }

        self.vel_ctrl_output
    }
}
