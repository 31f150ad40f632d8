//! Main velocity control executable entry point.
//!
//! # Architecture
//!
//! The executable is driven by sensor events rather than a fixed cycle:
//!
//!     - Initialise all modules
//!     - Start the event source, which replays an event script on its own thread and pushes each
//!       event into a bounded channel
//!     - Main loop, once per event:
//!         - Safe mode management
//!         - Velocity control processing
//!         - Sending demands to the actuator
//!
//! The main loop is the only owner of the data store, so each event is handled against a
//! consistent view of the odometry, surface and anticipation state.
//!
//! # Modules
//!
//! All modules (e.g. `vel_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::{
    dems::{VelDems, VelDemsResponse},
    sens::SensEvent,
};
use vel_lib::{
    actuator::{Actuator, LogActuator},
    data_store::{DataStore, SafeModeCause},
    params::VelExecParams,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, trace, warn};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use util::{
    host,
    logger::{level_from_str, logger_init},
    module::State,
    script_interpreter::{PendingEvents, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which the event source polls the script for pending events.
const SCRIPT_POLL_PERIOD_S: f64 = 0.001;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Terrain adaptive velocity control executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "vel_exec")]
struct Opt {
    /// Path to the event script to replay.
    #[structopt(parse(from_os_str))]
    script_path: PathBuf,

    /// Executable parameter file, relative to the params directory.
    #[structopt(long, default_value = "vel_exec.toml")]
    exec_params: String,

    /// VelCtrl parameter file, relative to the params directory. Overrides the file given in the
    /// executable parameters.
    #[structopt(long)]
    vel_ctrl_params: Option<String>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- LOAD PARAMETERS ----

    let exec_params: VelExecParams =
        util::params::load(&opt.exec_params).wrap_err("Could not load exec params")?;
    exec_params.validate().wrap_err("Invalid exec params")?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("vel_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(
        level_from_str(&exec_params.log_level).wrap_err("Invalid log level")?,
        level_from_str(&exec_params.vel_ctrl_log_level).wrap_err("Invalid VelCtrl log level")?,
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Velocity Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- INITIALISE EVENT SOURCE ----

    info!("Loading script from {:?}", opt.script_path);

    let si = ScriptInterpreter::new(&opt.script_path).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} events\n",
        si.get_duration(),
        si.get_num_events()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    let vel_ctrl_params = opt
        .vel_ctrl_params
        .clone()
        .unwrap_or_else(|| exec_params.vel_ctrl_params.clone());

    ds.vel_ctrl
        .init(vel_ctrl_params, &session)
        .wrap_err("Failed to initialise VelCtrl")?;
    info!("VelCtrl init complete");

    let mut actuator = LogActuator::new();

    info!("Module initialisation complete\n");

    // ---- START EVENT SOURCE ----

    let (event_tx, event_rx) = mpsc::sync_channel(exec_params.event_channel_bound);

    let source_handle = thread::Builder::new()
        .name(String::from("event_source"))
        .spawn(move || replay_script(si, event_tx))
        .wrap_err("Failed to start the event source")?;

    let event_timeout = exec_params.event_timeout().wrap_err("Invalid event timeout")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // ---- EVENT ACQUISITION ----

        let event = match event_rx.recv_timeout(event_timeout) {
            Ok(e) => {
                ds.make_unsafe(SafeModeCause::EventSourceLost).ok();
                e
            }
            Err(RecvTimeoutError::Timeout) => {
                if !ds.safe {
                    error!(
                        "No events received for {:.3} s, event source lost",
                        exec_params.event_timeout_s
                    );
                }
                ds.make_safe(SafeModeCause::EventSourceLost);

                send_demands(&mut actuator, &VelDems::stop());
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                info!("End of event script reached, stopping");
                break;
            }
        };

        trace!("{} event: {:?}", event.kind(), event);

        // ---- CONTROL ALGORITHM PROCESSING ----

        if let Some(dems) = ds.process(&event) {
            send_demands(&mut actuator, &dems);
        }
    }

    // ---- SHUTDOWN ----

    let num_replayed = source_handle
        .join()
        .map_err(|_| eyre!("The event source thread panicked"))?;

    // Send a final stop before exiting
    send_demands(&mut actuator, &VelDems::stop());

    info!(
        "Processed {} of {} replayed events, {} demands issued, {} sent, {} velocity anomalies",
        ds.num_events,
        num_replayed,
        ds.num_dems,
        actuator.num_dems_sent(),
        ds.num_velocity_anomalies
    );

    info!("Learned surface profiles:");
    for (id, profile) in ds.vel_ctrl.surfaces().profiles() {
        info!(
            "    {:>4}: max speed {:.3} m/s, max accel {:.3} m/s^2",
            id, profile.max_speed_ms, profile.max_accel_mss
        );
    }

    info!("End of execution");

    Ok(())
}

/// Replay the script into the channel in real time, returning the number of events sent.
///
/// Stops early if the receiving end of the channel is dropped.
fn replay_script(mut si: ScriptInterpreter, tx: SyncSender<SensEvent>) -> usize {
    let mut num_sent = 0;

    loop {
        match si.get_pending_events() {
            PendingEvents::None => thread::sleep(Duration::from_secs_f64(SCRIPT_POLL_PERIOD_S)),
            PendingEvents::Some(events) => {
                for event in events {
                    if tx.send(event).is_err() {
                        warn!("Event channel closed, stopping script replay");
                        return num_sent;
                    }
                    num_sent += 1;
                }
            }
            PendingEvents::EndOfScript => return num_sent,
        }
    }
}

/// Send demands to the actuator, warning on any non-nominal response.
fn send_demands<A: Actuator>(actuator: &mut A, dems: &VelDems) {
    match actuator.send_demands(dems) {
        Ok(VelDemsResponse::DemsOk) => (),
        Ok(r) => warn!("Recieved non-nominal response from the actuator: {:?}", r),
        Err(e) => warn!("Actuator error: {}", e),
    }
}
