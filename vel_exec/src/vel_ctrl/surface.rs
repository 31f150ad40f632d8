//! # Surface profile store
//!
//! Maps each surface reported by the terrain classifier to the speed and
//! acceleration limits learned for it.
//!
//! Unclassified terrain uses a single placeholder profile stored under
//! [`UNKNOWN_SURFACE_ID`]. The placeholder acts as a scratch buffer: limits
//! learned while driving over unclassified terrain are copied into the first
//! new surface the robot moves onto, after which the placeholder is reset.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal
use super::VelCtrlError;
pub use comms_if::sens::UNKNOWN_SURFACE_ID;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed and acceleration limits for a single surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    /// Maximum forward speed magnitude.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Maximum forward acceleration magnitude.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,
}

/// Store of all known surface profiles.
#[derive(Debug, Clone)]
pub struct SurfaceRegistry {
    profiles: HashMap<i32, SurfaceProfile>,

    default_profile: SurfaceProfile,

    min_max_speed_ms: f64,

    current_id: i32,

    previous_id: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What happened to the registry on a surface report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SurfaceTransition {
    /// Reported a surface which already had a profile, including the active one.
    Known,

    /// Moved off unclassified terrain onto a new surface, which inherited the
    /// placeholder's profile.
    Promoted,

    /// Moved from one classified surface onto a new one, which was given the
    /// default profile.
    Created,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SurfaceProfile {
    pub fn new(max_speed_ms: f64, max_accel_mss: f64) -> Self {
        Self {
            max_speed_ms,
            max_accel_mss,
        }
    }
}

impl SurfaceRegistry {
    /// Create a new registry holding only the placeholder profile, which is
    /// also the active surface.
    pub fn new(default_profile: SurfaceProfile, min_max_speed_ms: f64) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(UNKNOWN_SURFACE_ID, default_profile);

        Self {
            profiles,
            default_profile,
            min_max_speed_ms,
            current_id: UNKNOWN_SURFACE_ID,
            previous_id: UNKNOWN_SURFACE_ID,
        }
    }

    /// Map any negative (unclassified) surface ID onto the placeholder ID.
    pub fn normalise_id(id: i32) -> i32 {
        if id < 0 {
            UNKNOWN_SURFACE_ID
        } else {
            id
        }
    }

    /// Handle a surface report from the classifier.
    ///
    /// Every report of a surface which already has a profile resets the
    /// placeholder, even if that surface is the active one.
    pub fn on_surface_changed(&mut self, new_id: i32) -> SurfaceTransition {
        let new_id = Self::normalise_id(new_id);

        self.previous_id = self.current_id;
        self.current_id = new_id;

        let transition = if self.profiles.contains_key(&new_id) {
            self.reset_placeholder();
            SurfaceTransition::Known
        } else if self.previous_id == UNKNOWN_SURFACE_ID {
            let learnt = self.placeholder_profile();
            self.profiles.insert(new_id, learnt);
            self.reset_placeholder();
            SurfaceTransition::Promoted
        } else {
            self.profiles.insert(new_id, self.default_profile);
            SurfaceTransition::Created
        };

        debug!(
            "Surface changed {} -> {} ({:?}), profile: {:?}",
            self.previous_id,
            self.current_id,
            transition,
            self.active_profile()
        );

        transition
    }

    /// Get the profile for the given surface, if there is one.
    pub fn get_profile(&self, surface_id: i32) -> Option<SurfaceProfile> {
        self.profiles.get(&Self::normalise_id(surface_id)).copied()
    }

    /// Get the profile of the currently active surface.
    pub fn active_profile(&self) -> SurfaceProfile {
        // The active surface is always given a profile before becoming active
        self.profiles
            .get(&self.current_id)
            .copied()
            .unwrap_or(self.default_profile)
    }

    /// Lower the maximum speed of a surface.
    ///
    /// The value is floored at the minimum maximum speed, and is never allowed
    /// to increase. Returns the maximum speed now stored for the surface.
    pub fn ratchet_max_speed(
        &mut self,
        surface_id: i32,
        new_max_ms: f64,
    ) -> Result<f64, VelCtrlError> {
        let floor = self.min_max_speed_ms;
        let surface_id = Self::normalise_id(surface_id);

        let profile = self
            .profiles
            .get_mut(&surface_id)
            .ok_or(VelCtrlError::UnknownSurface(surface_id))?;

        profile.max_speed_ms = profile.max_speed_ms.min(new_max_ms.max(floor));

        Ok(profile.max_speed_ms)
    }

    /// ID of the active surface.
    pub fn current_id(&self) -> i32 {
        self.current_id
    }

    /// ID of the surface which was active before the current one.
    pub fn previous_id(&self) -> i32 {
        self.previous_id
    }

    /// The profile a new surface starts with.
    pub fn default_profile(&self) -> SurfaceProfile {
        self.default_profile
    }

    /// Number of profiles, including the placeholder.
    pub fn num_profiles(&self) -> usize {
        self.profiles.len()
    }

    /// All profiles sorted by surface ID.
    pub fn profiles(&self) -> Vec<(i32, SurfaceProfile)> {
        let mut v: Vec<(i32, SurfaceProfile)> =
            self.profiles.iter().map(|(id, p)| (*id, *p)).collect();
        v.sort_by_key(|(id, _)| *id);
        v
    }

    fn placeholder_profile(&self) -> SurfaceProfile {
        self.profiles
            .get(&UNKNOWN_SURFACE_ID)
            .copied()
            .unwrap_or(self.default_profile)
    }

    fn reset_placeholder(&mut self) {
        self.profiles.insert(UNKNOWN_SURFACE_ID, self.default_profile);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn registry() -> SurfaceRegistry {
        SurfaceRegistry::new(SurfaceProfile::new(2.0, 0.25), 0.05)
    }

    #[test]
    fn test_starts_on_placeholder() {
        let reg = registry();
        assert_eq!(reg.current_id(), UNKNOWN_SURFACE_ID);
        assert_eq!(reg.active_profile(), SurfaceProfile::new(2.0, 0.25));
        assert_eq!(reg.num_profiles(), 1);
    }

    #[test]
    fn test_promotion_from_unknown() {
        let mut reg = registry();

        // Learn something while on unclassified terrain
        reg.ratchet_max_speed(UNKNOWN_SURFACE_ID, 1.2).unwrap();
        let learnt = reg.active_profile();
        assert_eq!(learnt.max_speed_ms, 1.2);

        assert_eq!(reg.on_surface_changed(4), SurfaceTransition::Promoted);
        assert_eq!(reg.get_profile(4), Some(learnt));
        assert_eq!(
            reg.get_profile(UNKNOWN_SURFACE_ID),
            Some(SurfaceProfile::new(2.0, 0.25))
        );
        assert_eq!(reg.active_profile(), learnt);
    }

    #[test]
    fn test_new_surface_from_known_gets_default() {
        let mut reg = registry();
        reg.on_surface_changed(1);
        reg.ratchet_max_speed(1, 0.8).unwrap();

        assert_eq!(reg.on_surface_changed(2), SurfaceTransition::Created);
        assert_eq!(reg.get_profile(2), Some(SurfaceProfile::new(2.0, 0.25)));
        assert_eq!(reg.get_profile(1).unwrap().max_speed_ms, 0.8);
        assert_eq!(reg.previous_id(), 1);
    }

    #[test]
    fn test_known_surface_resets_placeholder() {
        let mut reg = registry();
        reg.on_surface_changed(1);

        // Back onto unclassified terrain and learn there
        assert_eq!(
            reg.on_surface_changed(UNKNOWN_SURFACE_ID),
            SurfaceTransition::Known
        );
        reg.ratchet_max_speed(UNKNOWN_SURFACE_ID, 0.9).unwrap();

        // Onto a known surface, scratch learning is discarded
        assert_eq!(reg.on_surface_changed(1), SurfaceTransition::Known);
        assert_eq!(
            reg.get_profile(UNKNOWN_SURFACE_ID),
            Some(SurfaceProfile::new(2.0, 0.25))
        );
        assert_eq!(reg.num_profiles(), 2);
    }

    #[test]
    fn test_repeated_unknown_report_resets_placeholder() {
        let mut reg = registry();
        reg.ratchet_max_speed(UNKNOWN_SURFACE_ID, 1.0).unwrap();

        assert_eq!(
            reg.on_surface_changed(UNKNOWN_SURFACE_ID),
            SurfaceTransition::Known
        );
        assert_eq!(reg.active_profile(), SurfaceProfile::new(2.0, 0.25));

        // Nothing learnt is carried into the next surface
        assert_eq!(reg.on_surface_changed(6), SurfaceTransition::Promoted);
        assert_eq!(reg.get_profile(6), Some(SurfaceProfile::new(2.0, 0.25)));
    }

    #[test]
    fn test_repeated_known_report_keeps_profile() {
        let mut reg = registry();
        reg.on_surface_changed(2);
        reg.ratchet_max_speed(2, 0.7).unwrap();

        assert_eq!(reg.on_surface_changed(2), SurfaceTransition::Known);
        assert_eq!(reg.get_profile(2).unwrap().max_speed_ms, 0.7);
        assert_eq!(reg.current_id(), 2);
        assert_eq!(reg.num_profiles(), 2);
    }

    #[test]
    fn test_negative_ids_are_unknown() {
        let mut reg = registry();
        reg.on_surface_changed(3);
        assert_eq!(reg.on_surface_changed(-7), SurfaceTransition::Known);
        assert_eq!(reg.current_id(), UNKNOWN_SURFACE_ID);
        assert_eq!(reg.num_profiles(), 2);
    }

    #[test]
    fn test_ratchet_is_monotonic_and_floored() {
        let mut reg = registry();
        reg.on_surface_changed(2);

        let mut last = reg.active_profile().max_speed_ms;
        for new_max in [1.5, 1.7, 0.6, 0.9, -0.4, 0.3].iter() {
            let now = reg.ratchet_max_speed(2, *new_max).unwrap();
            assert!(now <= last);
            assert!(now >= 0.05);
            last = now;
        }
        assert_eq!(last, 0.05);
    }

    #[test]
    fn test_ratchet_unknown_surface() {
        let mut reg = registry();
        assert_eq!(
            reg.ratchet_max_speed(9, 1.0),
            Err(VelCtrlError::UnknownSurface(9))
        );
    }
}
