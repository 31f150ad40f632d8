//! # Velocity control library.
//!
//! This library allows other crates in the workspace, the benchmarks and the integration tests to
//! access items defined inside the velocity control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator - the sink for the speed demands produced by the executable
pub mod actuator;

/// Data store - the executable's global state, including safe mode
pub mod data_store;

/// Executable parameters
pub mod params;

/// Velocity control module - shapes joystick input into terrain-adapted speed demands
pub mod vel_ctrl;
