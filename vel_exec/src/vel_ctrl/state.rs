//! Implementations for the VelCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    BumpinessTracker, Params, PidCorrector, SurfaceProfile, SurfaceRegistry, SurfaceTransition,
    VelCtrlError, VelCtrlInitError, VibrationMonitor, VibrationWindow, WindowChange,
};
use comms_if::{dems::VelDems, sens::SensEvent};
use util::{maths, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity control module state
#[derive(Debug, Clone)]
pub struct VelCtrl {
    pub(crate) params: Params,

    surfaces: SurfaceRegistry,

    vibration: VibrationMonitor,

    anticipation: BumpinessTracker,

    pid: PidCorrector,

    pub(crate) loop_state: ControlLoopState,

    pub(crate) report: StatusReport,
}

/// Command history and feedback used by the command shaper.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ControlLoopState {
    /// The last speed commanded.
    ///
    /// Units: meters/second
    pub prev_cmd_ms: f64,

    /// The speed commanded before `prev_cmd_ms`.
    ///
    /// Units: meters/second
    pub older_cmd_ms: f64,

    /// The last commanded speed which was within the anomaly limit.
    ///
    /// Units: meters/second
    pub last_safe_cmd_ms: f64,

    /// Speed from the most recent odometry sample.
    ///
    /// Units: meters/second
    pub measured_speed_ms: f64,

    /// Time between the two most recent odometry samples.
    ///
    /// Units: seconds
    pub odom_dt_s: f64,

    /// Timestamp of the most recent odometry sample.
    pub prev_odom_stamp_s: Option<f64>,

    /// Timestamp of the most recent joystick sample with the deadman held.
    pub prev_joy_stamp_s: Option<f64>,
}

/// Status report for VelCtrl processing of a single event.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Active surface after the event
    pub surface_id: i32,

    /// Set if the event was a surface report
    pub surface_transition: Option<SurfaceTransition>,

    pub anticipating_rougher: bool,
    pub anticipating_smoother: bool,

    /// Set if the event was a position sample
    pub window_change: Option<WindowChange>,

    /// Set if the event completed a vibration window
    pub vibration: Option<VibrationWindow>,

    /// New maximum speed of the active surface if it was ratcheted down
    pub ratcheted_max_speed_ms: Option<f64>,

    /// Joystick sample received without the deadman held
    pub deadman_released: bool,

    /// Speed demanded by the joystick before any limits
    pub raw_target_ms: f64,

    /// Speed was capped because rougher terrain is anticipated
    pub anticipation_limited: bool,

    /// Speed was capped by the surface's maximum speed
    pub surface_limited: bool,

    /// Target after the anticipation and surface limits
    pub limited_target_ms: f64,

    /// The previous command was re-issued without shaping
    pub held: bool,

    /// Target was ramped to respect the surface's maximum acceleration
    pub accel_limited: bool,

    /// Target after the acceleration limit, passed to the PID corrector
    pub ramped_target_ms: f64,

    /// The commanded speed, if a command was issued
    pub output_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VelCtrl {
    fn default() -> Self {
        Self::build(Params::default())
    }
}

impl State for VelCtrl {
    type InitData = String;
    type InitError = VelCtrlInitError;

    type InputData = SensEvent;
    type OutputData = Option<VelDems>;
    type StatusReport = StatusReport;
    type ProcError = VelCtrlError;

    /// Initialise the VelCtrl module.
    ///
    /// Expected init data is the path to the parameter file, relative to the
    /// params directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params =
            params::load(&init_data).map_err(VelCtrlInitError::ParamLoadError)?;

        *self = Self::new(params)?;

        info!(
            "VelCtrl initialised from {:?} (session {:?})",
            init_data, session.session_root
        );
        debug!("VelCtrl params: {:#?}", self.params);

        Ok(())
    }

    /// Process a single sensor event.
    ///
    /// Only joystick events can produce a demand.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let output = match *input_data {
            SensEvent::Surface { id } => {
                self.on_surface_id(id);
                None
            }
            SensEvent::Roughness { value } => {
                self.on_roughness_statistic(value);
                None
            }
            SensEvent::Imu { z_accel_mss } => {
                self.on_vertical_acceleration(z_accel_mss);
                None
            }
            SensEvent::Odom {
                speed_ms,
                stamp_s,
                pos_x_m,
            } => {
                self.on_odometry_sample(speed_ms, stamp_s, pos_x_m);
                None
            }
            SensEvent::Joy {
                axis,
                deadman,
                stamp_s,
            } => self
                .shape(axis, deadman, stamp_s)?
                .map(|speed_ms| VelDems { speed_ms }),
        };

        self.fill_report();

        Ok((output, self.report))
    }

    /// Forget the command history so that the next demand ramps up from
    /// standstill.
    fn make_safe(&mut self) {
        self.loop_state.prev_cmd_ms = 0.0;
        self.loop_state.older_cmd_ms = 0.0;
        self.loop_state.last_safe_cmd_ms = 0.0;
        self.loop_state.prev_joy_stamp_s = None;
        self.pid.reset();

        info!("VelCtrl made safe, command history cleared");
    }
}

impl VelCtrl {
    /// Create a new instance from the given parameters.
    pub fn new(params: Params) -> Result<Self, VelCtrlInitError> {
        params.validate()?;

        Ok(Self::build(params))
    }

    fn build(params: Params) -> Self {
        let default_profile =
            SurfaceProfile::new(params.default_max_speed_ms, params.default_max_accel_mss);

        Self {
            surfaces: SurfaceRegistry::new(default_profile, params.min_max_speed_ms),
            vibration: VibrationMonitor::new(
                params.vibration_window_len,
                params.vibration_threshold_mss,
            ),
            anticipation: BumpinessTracker::new(
                params.roughness_ratio,
                params.lookahead_distance_m,
            ),
            pid: PidCorrector::new(params.k_p, params.k_i, params.k_d),
            loop_state: ControlLoopState::default(),
            report: StatusReport::default(),
            params,
        }
    }

    // ---- EVENT HANDLERS ----

    /// Handle a surface report from the terrain classifier.
    pub fn on_surface_id(&mut self, id: i32) -> SurfaceTransition {
        let transition = self.surfaces.on_surface_changed(id);
        self.report.surface_transition = Some(transition);
        transition
    }

    /// Handle a roughness statistic for the terrain ahead.
    pub fn on_roughness_statistic(&mut self, value: f64) {
        if value < 0.0 {
            warn!("Ignoring negative roughness statistic {}", value);
            return;
        }

        let was_rougher = self.anticipation.is_anticipating_rougher();
        let was_smoother = self.anticipation.is_anticipating_smoother();

        self.anticipation.on_roughness_sample(value);

        if !was_rougher && self.anticipation.is_anticipating_rougher() {
            debug!("Rougher terrain ahead (roughness {:.3})", value);
        }
        if !was_smoother && self.anticipation.is_anticipating_smoother() {
            debug!("Smoother terrain ahead (roughness {:.3})", value);
        }
    }

    /// Handle a vertical acceleration sample from the IMU.
    ///
    /// If the sample completes a window which vibrates too much while the
    /// robot is speeding up, the active surface's maximum speed is ratcheted
    /// down. Returns the new maximum speed if this happened.
    pub fn on_vertical_acceleration(&mut self, z_accel_mss: f64) -> Option<f64> {
        let window = self.vibration.observe(z_accel_mss)?;
        self.report.vibration = Some(window);

        trace!("Vibration window std dev {:.4} m/s^2", window.std_dev_mss);

        if !window.over_threshold {
            return None;
        }

        let prev_speed_ms = self.loop_state.prev_cmd_ms.abs();
        let older_speed_ms = self.loop_state.older_cmd_ms.abs();

        // Only blame the surface if we were speeding up, and weren't just about
        // to leave it
        if prev_speed_ms <= older_speed_ms || self.anticipation.is_anticipating_smoother() {
            return None;
        }

        let surface_id = self.surfaces.current_id();
        let current_max_ms = self.surfaces.active_profile().max_speed_ms;
        let new_max_ms = prev_speed_ms.min(current_max_ms) - self.params.ratchet_margin_ms;

        match self.surfaces.ratchet_max_speed(surface_id, new_max_ms) {
            Ok(max_ms) => {
                warn!(
                    "Vibration of {:.3} m/s^2 on surface {}, max speed {:.3} -> {:.3} m/s",
                    window.std_dev_mss, surface_id, current_max_ms, max_ms
                );
                self.report.ratcheted_max_speed_ms = Some(max_ms);
                Some(max_ms)
            }
            Err(e) => {
                warn!("Could not ratchet max speed: {}", e);
                None
            }
        }
    }

    /// Handle a filtered odometry sample.
    pub fn on_odometry_sample(&mut self, speed_ms: f64, stamp_s: f64, pos_x_m: f64) {
        self.loop_state.measured_speed_ms = speed_ms;

        // The first sample has nothing to measure elapsed time against
        self.loop_state.odom_dt_s = match self.loop_state.prev_odom_stamp_s {
            Some(t) => stamp_s - t,
            None => 0.0,
        };
        self.loop_state.prev_odom_stamp_s = Some(stamp_s);

        let change = self.anticipation.on_position_sample(pos_x_m);
        match change {
            WindowChange::Opened => debug!("Anticipation window opened at x = {:.3} m", pos_x_m),
            WindowChange::Closed => debug!("Anticipation window closed at x = {:.3} m", pos_x_m),
            WindowChange::None => (),
        }
        self.report.window_change = Some(change);
    }

    /// Handle a joystick sample, returning the commanded speed if one is
    /// issued.
    pub fn on_joystick_sample(
        &mut self,
        axis: f64,
        deadman: bool,
        stamp_s: f64,
    ) -> Result<Option<f64>, VelCtrlError> {
        self.report = StatusReport::default();
        let output = self.shape(axis, deadman, stamp_s);
        self.fill_report();
        output
    }

    // ---- ACCESSORS ----

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    pub fn anticipation(&self) -> &BumpinessTracker {
        &self.anticipation
    }

    pub fn pid(&self) -> &PidCorrector {
        &self.pid
    }

    pub fn loop_state(&self) -> &ControlLoopState {
        &self.loop_state
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The last commanded speed which was within the anomaly limit.
    pub fn last_safe_cmd_ms(&self) -> f64 {
        self.loop_state.last_safe_cmd_ms
    }

    // ---- COMMAND SHAPING ----

    /// Shape the joystick demand into the commanded speed.
    fn shape(&mut self, axis: f64, deadman: bool, stamp_s: f64) -> Result<Option<f64>, VelCtrlError> {
        if !deadman {
            self.report.deadman_released = true;
            return Ok(None);
        }

        let raw_target_ms = axis * self.params.joy_axis_scale_ms;
        let direction = maths::direction(raw_target_ms);
        let mut speed_ms = raw_target_ms.abs();
        self.report.raw_target_ms = raw_target_ms;

        // Slow down early for rougher terrain ahead
        if self.anticipation.is_anticipating_rougher()
            && speed_ms > self.params.anticipation_max_speed_ms
        {
            speed_ms = self.params.anticipation_max_speed_ms;
            self.report.anticipation_limited = true;
        }

        let profile = self.surfaces.active_profile();
        if speed_ms > profile.max_speed_ms {
            speed_ms = profile.max_speed_ms;
            self.report.surface_limited = true;
        }

        let mut target_ms = speed_ms * direction;
        self.report.limited_target_ms = target_ms;

        let prev_cmd_ms = self.loop_state.prev_cmd_ms;

        // Reject the tick if the last command got out of hand
        if prev_cmd_ms.abs() > self.params.anomaly_limit_ms {
            let held_ms = self.loop_state.last_safe_cmd_ms;

            self.loop_state.prev_cmd_ms = held_ms;
            self.loop_state.older_cmd_ms = held_ms;
            self.loop_state.prev_joy_stamp_s = Some(stamp_s);

            self.report.held = true;
            self.report.output_ms = Some(held_ms);

            let err = VelCtrlError::AnomalousVelocity {
                cmd_ms: prev_cmd_ms,
                limit_ms: self.params.anomaly_limit_ms,
                held_ms,
            };
            error!("{}", err);
            return Err(err);
        }

        let dt_s = match self.loop_state.prev_joy_stamp_s {
            Some(t) => stamp_s - t,
            None => 0.0,
        };
        self.loop_state.prev_joy_stamp_s = Some(stamp_s);

        // Nothing to differentiate against, hold the last command
        if dt_s <= 0.0 {
            if dt_s < 0.0 {
                warn!(
                    "Joystick sample is {:.3} s older than the previous one, holding",
                    -dt_s
                );
            }
            self.report.held = true;
            self.report.ramped_target_ms = prev_cmd_ms;
            self.report.output_ms = Some(prev_cmd_ms);
            return Ok(Some(prev_cmd_ms));
        }

        let accel_mss = (target_ms - prev_cmd_ms) / dt_s;
        if accel_mss.abs() > profile.max_accel_mss {
            target_ms = prev_cmd_ms + maths::direction(accel_mss) * profile.max_accel_mss * dt_s;
            self.report.accel_limited = true;
        }
        self.report.ramped_target_ms = target_ms;

        let cmd_ms = self.pid.correct(
            target_ms,
            self.loop_state.measured_speed_ms,
            self.loop_state.odom_dt_s,
        );

        self.loop_state.older_cmd_ms = prev_cmd_ms;
        self.loop_state.prev_cmd_ms = cmd_ms;
        if cmd_ms.abs() <= self.params.anomaly_limit_ms {
            self.loop_state.last_safe_cmd_ms = cmd_ms;
        }

        trace!(
            "VelCtrl: raw {:.3}, limited {:.3}, ramped {:.3}, cmd {:.3} m/s (dt {:.3} s)",
            raw_target_ms,
            self.report.limited_target_ms,
            target_ms,
            cmd_ms,
            dt_s
        );

        self.report.output_ms = Some(cmd_ms);

        Ok(Some(cmd_ms))
    }

    /// Fill in the parts of the status report common to all events.
    fn fill_report(&mut self) {
        self.report.surface_id = self.surfaces.current_id();
        self.report.anticipating_rougher = self.anticipation.is_anticipating_rougher();
        self.report.anticipating_smoother = self.anticipation.is_anticipating_smoother();
    }
}
