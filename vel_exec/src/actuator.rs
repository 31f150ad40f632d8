//! # Actuator
//!
//! Speed demands leave the executable through an [`Actuator`]. The shipped implementation only logs
//! the demands, a drive interface implements the same trait.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::dems::{VelDems, VelDemsResponse};
use log::{info, warn};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for speed demands.
pub trait Actuator {
    /// Send demands to the actuator.
    ///
    /// Returns the actuator's response to the demands, or an error if they could not be delivered.
    fn send_demands(&mut self, demands: &VelDems) -> Result<VelDemsResponse, ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator which writes each demand to the log.
#[derive(Debug, Default)]
pub struct LogActuator {
    num_dems_sent: u64,

    last_dems: Option<VelDems>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ActuatorError {
    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Actuator for LogActuator {
    fn send_demands(&mut self, demands: &VelDems) -> Result<VelDemsResponse, ActuatorError> {
        if !demands.speed_ms.is_finite() {
            warn!("Rejecting non-finite speed demand {:?}", demands);
            return Ok(VelDemsResponse::DemsInvalid);
        }

        let dems_str =
            serde_json::to_string(demands).map_err(ActuatorError::SerializationError)?;

        info!("VelDems: {}", dems_str);

        self.num_dems_sent += 1;
        self.last_dems = Some(*demands);

        Ok(VelDemsResponse::DemsOk)
    }
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of demands accepted so far.
    pub fn num_dems_sent(&self) -> u64 {
        self.num_dems_sent
    }

    /// The most recently accepted demand.
    pub fn last_dems(&self) -> Option<VelDems> {
        self.last_dems
    }
}
