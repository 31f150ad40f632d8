//! # Communications interface crate.
//!
//! Provides the common interfaces between the velocity controller and its
//! collaborators: the sensor events coming in and the demands going out.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Sensor events delivered to the velocity controller
pub mod sens;

/// Demands issued by the velocity controller to the actuators
pub mod dems;
