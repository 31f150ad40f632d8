//! # Event script interpreter module
//!
//! This module provides an interpreter for event scripts, allowing recorded or
//! hand written sequences of sensor events to be replayed into the velocity
//! controller.
//!
//! A script is a list of entries of the form `<time_s>: <event JSON>;`, for
//! example:
//!
//! ```text
//! 0.00: {"type": "SURFACE", "id": -1};
//! 0.10: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 0.10};
//! ```
//!
//! Anything outside of an entry (such as comment lines) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::sens::{SensEvent, SensParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An event which is scripted to occur at a specific time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedEvent {
    /// The time the event is supposed to be delivered at
    pub exec_time_s: f64,

    /// The event to deliver
    pub event: SensEvent,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_events` to acquire a list of events that need delivering.
#[derive(Debug)]
pub struct ScriptInterpreter {
    events: VecDeque<ScriptedEvent>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid event at {0} s: {1}")]
    InvalidEvent(f64, SensParseError),

    #[error("Script entry at {0} s is earlier than the entry before it")]
    OutOfOrder(f64),

    #[error("Could not build the script parser: {0}")]
    ParserError(regex::Error),
}

#[derive(Debug, PartialEq)]
pub enum PendingEvents {
    None,
    Some(Vec<SensEvent>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.display().to_string()));
        }

        let script = fs::read_to_string(path).map_err(ScriptError::ScriptLoadError)?;

        Self::from_str(&script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        let mut events: VecDeque<ScriptedEvent> = VecDeque::new();

        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::ParserError)?;

        for cap in re.captures_iter(script) {
            // Groups 1 and 3 always participate in a match
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let event_str = cap.get(3).map(|m| m.as_str()).unwrap_or_default();

            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(last) = events.back() {
                if exec_time_s < last.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s));
                }
            }

            let event = SensEvent::from_json(event_str)
                .map_err(|e| ScriptError::InvalidEvent(exec_time_s, e))?;

            events.push_back(ScriptedEvent { exec_time_s, event });
        }

        if events.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { events })
    }

    /// Return the events whose time has come relative to the session epoch.
    pub fn get_pending_events(&mut self) -> PendingEvents {
        self.get_pending_events_at(get_elapsed_seconds())
    }

    /// Return all events scheduled at or before `current_time_s`.
    pub fn get_pending_events_at(&mut self, current_time_s: f64) -> PendingEvents {
        if self.events.is_empty() {
            return PendingEvents::EndOfScript;
        }

        let mut pending = vec![];

        while let Some(front) = self.events.front() {
            if front.exec_time_s > current_time_s {
                break;
            }

            if let Some(e) = self.events.pop_front() {
                pending.push(e.event);
            }
        }

        if pending.is_empty() {
            PendingEvents::None
        } else {
            PendingEvents::Some(pending)
        }
    }

    /// Scheduled time of the next event, if there is one.
    pub fn next_exec_time_s(&self) -> Option<f64> {
        self.events.front().map(|e| e.exec_time_s)
    }

    /// Get the number of events remaining in the script
    pub fn get_num_events(&self) -> usize {
        self.events.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.events.back() {
            Some(e) => e.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        # Unknown surface, rough patch ahead
        0.00: {"type": "SURFACE", "id": -1};
        0.05: {"type": "ROUGHNESS", "value": 0.1};
        0.10: {"type": "ROUGHNESS", "value": 0.3};
        0.10: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 0.10};
        0.20: {"type": "ODOM", "speed_ms": 0.02, "stamp_s": 0.20, "pos_x_m": 0.0};
    "#;

    #[test]
    fn test_load_script() {
        let si = ScriptInterpreter::from_str(SCRIPT).unwrap();
        assert_eq!(si.get_num_events(), 5);
        assert_eq!(si.get_duration(), 0.2);
        assert_eq!(si.next_exec_time_s(), Some(0.0));
    }

    #[test]
    fn test_pending_events() {
        let mut si = ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(
            si.get_pending_events_at(0.01),
            PendingEvents::Some(vec![SensEvent::Surface { id: -1 }])
        );
        assert_eq!(si.get_pending_events_at(0.02), PendingEvents::None);

        match si.get_pending_events_at(0.10) {
            PendingEvents::Some(v) => {
                assert_eq!(v.len(), 3);
                assert_eq!(v[1], SensEvent::Roughness { value: 0.3 });
            }
            p => panic!("Expected pending events, got {:?}", p),
        }

        assert!(matches!(
            si.get_pending_events_at(1.0),
            PendingEvents::Some(_)
        ));
        assert_eq!(si.get_pending_events_at(2.0), PendingEvents::EndOfScript);
    }

    #[test]
    fn test_empty_script() {
        assert!(matches!(
            ScriptInterpreter::from_str("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
    }

    #[test]
    fn test_invalid_event() {
        assert!(matches!(
            ScriptInterpreter::from_str(r#"1.0: {"type": "JOY", "axis": -1.0};"#),
            Err(ScriptError::InvalidEvent(t, _)) if t == 1.0
        ));
    }

    #[test]
    fn test_out_of_order() {
        let script = r#"
            1.0: {"type": "SURFACE", "id": 1};
            0.5: {"type": "SURFACE", "id": 2};
        "#;
        assert!(matches!(
            ScriptInterpreter::from_str(script),
            Err(ScriptError::OutOfOrder(_))
        ));
    }

    #[test]
    fn test_missing_script() {
        assert!(matches!(
            ScriptInterpreter::new("/no/such/script.vs"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
