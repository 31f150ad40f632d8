//! # Velocity Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::sens::SensEvent;
use util::module::State;
use vel_lib::vel_ctrl::VelCtrl;

fn joystick_benchmark(c: &mut Criterion) {
    let mut vel_ctrl = VelCtrl::default();

    vel_ctrl.on_roughness_statistic(0.1);
    vel_ctrl.on_odometry_sample(0.0, 0.0, 0.0);

    let mut stamp_s = 0.0;

    c.bench_function("vel_ctrl joystick sample", |b| {
        b.iter(|| {
            stamp_s += 0.1;
            vel_ctrl.on_joystick_sample(black_box(-0.5), true, stamp_s)
        })
    });
}

fn mixed_events_benchmark(c: &mut Criterion) {
    // One second of sensor traffic: 50 Hz IMU, 10 Hz odometry and joystick, 5 Hz roughness
    let mut events = vec![SensEvent::Surface { id: -1 }];
    for i in 0..50 {
        let t = i as f64 * 0.02;
        let z = if i % 2 == 0 { 9.9 } else { 9.7 };
        events.push(SensEvent::Imu { z_accel_mss: z });

        if i % 5 == 0 {
            events.push(SensEvent::Odom {
                speed_ms: 0.1,
                stamp_s: t,
                pos_x_m: 0.1 * t,
            });
            events.push(SensEvent::Joy {
                axis: -0.5,
                deadman: true,
                stamp_s: t,
            });
        }

        if i % 10 == 0 {
            events.push(SensEvent::Roughness { value: 0.1 });
        }
    }

    c.bench_function("vel_ctrl 1 s of events", |b| {
        b.iter(|| {
            let mut vel_ctrl = VelCtrl::default();
            for e in events.iter() {
                vel_ctrl.proc(black_box(e)).ok();
            }
            vel_ctrl
        })
    });
}

criterion_group!(benches, joystick_benchmark, mixed_events_benchmark);
criterion_main!(benches);
