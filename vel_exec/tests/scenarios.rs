//! # Velocity control scenarios
//!
//! Drives the library through complete event sequences, in the same way the executable does.

use comms_if::{
    dems::VelDems,
    sens::{SensEvent, UNKNOWN_SURFACE_ID},
};
use util::script_interpreter::{PendingEvents, ScriptInterpreter};
use vel_lib::{
    data_store::{DataStore, SafeModeCause},
    vel_ctrl::{SurfaceTransition, VelCtrl},
};

/// Run a script to completion, returning every demand issued.
fn run_script(ds: &mut DataStore, script: &str) -> Vec<VelDems> {
    let mut si = ScriptInterpreter::from_str(script).unwrap();
    let mut dems = vec![];

    let mut t = 0.0;
    loop {
        match si.get_pending_events_at(t) {
            PendingEvents::None => (),
            PendingEvents::Some(events) => {
                for e in events.iter() {
                    if let Some(d) = ds.process(e) {
                        dems.push(d);
                    }
                }
            }
            PendingEvents::EndOfScript => break,
        }
        t += 0.01;
    }

    dems
}

#[test]
fn test_worked_example() {
    let mut vc = VelCtrl::default();

    vc.on_surface_id(-1);
    vc.on_roughness_statistic(0.1);
    vc.on_roughness_statistic(0.3);

    assert_eq!(vc.on_joystick_sample(-1.0, true, 0.0), Ok(Some(0.0)));
    let cmd = vc.on_joystick_sample(-1.0, true, 0.1).unwrap().unwrap();

    // 2.0 -> 0.2 (anticipation) -> 0.2 (surface) -> 0.025 (ramp)
    assert!((cmd - 0.025).abs() < 1e-9);
    assert_eq!(vc.report().surface_id, UNKNOWN_SURFACE_ID);
}

#[test]
fn test_anticipation_cap_lifts_after_lookahead() {
    let script = r#"
        0.00: {"type": "ROUGHNESS", "value": 0.1};
        0.00: {"type": "ROUGHNESS", "value": 0.3};
        0.00: {"type": "ODOM", "speed_ms": 0.0, "stamp_s": 0.0, "pos_x_m": 1.0};
        0.00: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 0.0};
        0.10: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 10.0};
        0.20: {"type": "ODOM", "speed_ms": 0.0, "stamp_s": 0.2, "pos_x_m": 1.2};
        0.30: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 10.1};
        0.40: {"type": "ODOM", "speed_ms": 0.0, "stamp_s": 0.4, "pos_x_m": 1.5};
        0.50: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 10.2};
    "#;

    let mut ds = DataStore::default();
    let dems = run_script(&mut ds, script);

    assert_eq!(dems.len(), 4);
    assert_eq!(dems[0], VelDems::stop());

    // Long gap lets the ramp reach the anticipation cap
    assert!((dems[1].speed_ms - 0.2).abs() < 1e-6);

    // Still inside the window at x = 1.2, capped at 0.2 plus the PID trim
    assert!((dems[2].speed_ms - 0.2).abs() < 1e-3);

    // Window closed at x = 1.5, free to ramp past the cap
    assert!(!ds.vel_ctrl.anticipation().is_anticipating());
    assert!(dems[3].speed_ms > 0.2);
    assert!(!ds.vel_ctrl_status_rpt.anticipation_limited);
}

#[test]
fn test_learning_carries_over_promotion() {
    // Accelerate on unknown terrain, shake, then get classified
    let mut script = String::from(
        r#"
        0.00: {"type": "SURFACE", "id": -1};
        0.00: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 0.0};
        0.00: {"type": "JOY", "axis": -1.0, "deadman": true, "stamp_s": 4.0};
        "#,
    );
    for i in 0..20 {
        let z = if i % 2 == 0 { 10.81 } else { 8.81 };
        script.push_str(&format!(
            "0.10: {{\"type\": \"IMU\", \"z_accel_mss\": {}}};\n",
            z
        ));
    }
    script.push_str(r#"0.20: {"type": "SURFACE", "id": 5};"#);

    let mut ds = DataStore::default();
    run_script(&mut ds, &script);

    let surfaces = ds.vel_ctrl.surfaces();
    assert_eq!(surfaces.current_id(), 5);

    // Ramped to 1.0 m/s then ratcheted to 1.0 - 0.15
    let learnt = surfaces.get_profile(5).unwrap();
    assert!((learnt.max_speed_ms - 0.85).abs() < 1e-9);
    assert_eq!(learnt.max_accel_mss, 0.25);
    assert_eq!(
        surfaces.get_profile(UNKNOWN_SURFACE_ID).unwrap(),
        surfaces.default_profile()
    );
}

#[test]
fn test_repeated_surface_reports() {
    let mut vc = VelCtrl::default();
    assert_eq!(vc.on_surface_id(2), SurfaceTransition::Promoted);
    assert_eq!(vc.on_surface_id(2), SurfaceTransition::Known);
    assert_eq!(vc.on_surface_id(3), SurfaceTransition::Created);
    assert_eq!(vc.on_surface_id(-4), SurfaceTransition::Known);
    assert_eq!(vc.on_surface_id(2), SurfaceTransition::Known);
    assert_eq!(vc.surfaces().num_profiles(), 3);
}

#[test]
fn test_safe_mode_on_lost_source() {
    let mut ds = DataStore::default();
    ds.process(&SensEvent::Joy {
        axis: -1.0,
        deadman: true,
        stamp_s: 0.0,
    });

    ds.make_safe(SafeModeCause::EventSourceLost);

    let d = ds.process(&SensEvent::Joy {
        axis: -1.0,
        deadman: true,
        stamp_s: 0.1,
    });
    assert_eq!(d, Some(VelDems::stop()));

    ds.make_unsafe(SafeModeCause::EventSourceLost).unwrap();

    // Command history was cleared, so the first tick is a hold from standstill
    let d = ds.process(&SensEvent::Joy {
        axis: -1.0,
        deadman: true,
        stamp_s: 0.2,
    });
    assert_eq!(d, Some(VelDems::stop()));
}

#[test]
fn test_demo_script_runs() {
    let mut ds = DataStore::default();
    let dems = run_script(&mut ds, include_str!("../../scripts/demo.vs"));

    assert!(!dems.is_empty());
    assert_eq!(ds.num_velocity_anomalies, 0);
    assert_eq!(ds.vel_ctrl.surfaces().current_id(), 1);

    for d in dems.iter() {
        assert!(d.speed_ms.is_finite());
        assert!(d.speed_ms.abs() <= 2.0);
    }
}
