//! End-to-end pipeline scenarios, driven through the core and the full task.

mod common;

use common::{
    CountingPower, FixedCommander, FixedStateEstimator, NoExternalPosition, PassthroughSitAw,
    ScriptedSensors,
};
use strix_common::config::StabilizerConfig;
use strix_common::types::{
    Attitude, AxisMode, Control, Setpoint, SetpointMode, Vector3, VehicleState,
};
use strix_stabilizer::cycle::{Collaborators, StabilizerTask};
use strix_stabilizer::safety::failsafe::DescentPhase;
use strix_stabilizer::stabilizer::StabilizerCore;

fn stock_core() -> StabilizerCore {
    StabilizerCore::new(&StabilizerConfig::default()).unwrap()
}

fn hover_setpoint() -> Setpoint {
    let mut setpoint = Setpoint::default();
    setpoint.mode = SetpointMode::uniform(AxisMode::Absolute);
    setpoint.position = Vector3::new(0.0, 0.0, 1.0);
    setpoint
}

fn hover_state() -> VehicleState {
    let mut state = VehicleState::default();
    state.position = Vector3::new(0.0, 0.0, 1.0);
    state
}

/// S1: hover hold at the target produces a level, hover-thrust command.
#[test]
fn s1_hover_hold() {
    let mut core = stock_core();
    let mut control = Control::default();
    let mut setpoint = hover_setpoint();
    let state = hover_state();

    for tick in 1..=10 {
        core.run(&mut control, &mut setpoint, &state, tick);
    }

    assert!(control.roll.abs() <= 1, "roll {}", control.roll);
    assert!(control.pitch.abs() <= 1, "pitch {}", control.pitch);
    assert!(control.yaw.abs() <= 1, "yaw {}", control.yaw);
    assert_eq!(
        control.thrust,
        core.position_controller().thrust_base(),
        "hover thrust must be the position controller's base"
    );
}

/// S2: manual thrust pass-through when mode.z is Disabled.
#[test]
fn s2_manual_thrust_pass_through() {
    let mut core = stock_core();
    let mut control = Control::default();
    let mut setpoint = Setpoint::default();
    setpoint.thrust = 30000;
    let state = VehicleState::default();

    // The first attitude tick latches the raw thrust; from then on the
    // output is exact on every main tick.
    for tick in 1..=100 {
        core.run(&mut control, &mut setpoint, &state, tick);
        if tick >= 2 {
            assert_eq!(control.thrust, 30000.0, "tick {tick}");
        }
    }
}

/// S3: velocity-mode yaw integrates the commanded rate, wrapped.
#[test]
fn s3_yaw_rate_integration() {
    let mut core = stock_core();
    let mut control = Control::default();
    let mut setpoint = Setpoint::default();
    setpoint.mode.yaw = AxisMode::Velocity;
    setpoint.attitude_rate.yaw = 500.0;
    setpoint.thrust = 30000; // keep thrust nonzero so the yaw reference survives
    let state = VehicleState::default();

    // 200 main ticks at 1000/500 Hz = 100 attitude ticks = 100 deg.
    for tick in 1..=200 {
        core.run(&mut control, &mut setpoint, &state, tick);
    }
    let yaw = core.attitude_desired().yaw;
    assert!((yaw + 100.0).abs() < 1e-3, "expected -100 deg, got {yaw}");

    // Another 200 attitude ticks pushes past -180 and must wrap.
    for tick in 201..=600 {
        core.run(&mut control, &mut setpoint, &state, tick);
    }
    let yaw = core.attitude_desired().yaw;
    assert!((-180.0..=180.0).contains(&yaw), "unwrapped yaw {yaw}");
    assert!((yaw - 60.0).abs() < 1e-2, "expected wrap to +60, got {yaw}");
}

/// S4: failsafe descent holds the configured tilt and landing thrust for
/// the full window, then turns off and disables the position modes.
#[test]
fn s4_failsafe_descent_timeline() {
    let mut core = stock_core();
    let mut control = Control::default();
    let mut setpoint = hover_setpoint();
    let mut state = hover_state();

    // Establish flight with ~hover thrust.
    for tick in 1..=20 {
        core.run(&mut control, &mut setpoint, &state, tick);
    }
    assert!(control.thrust > 0.0);

    // Estimator declares failsafe; the next position tick engages.
    state.failsafe = true;
    let mut tick = 21;
    while core.failsafe().phase() != DescentPhase::Active {
        core.run(&mut control, &mut setpoint, &state, tick);
        tick += 1;
    }
    assert_eq!(core.attitude_desired().roll, 2.0);
    assert_eq!(core.attitude_desired().pitch, 0.0);
    assert_eq!(core.actuator_thrust(), 36000.0);
    state.failsafe = false; // latch must survive the flag clearing

    // landing_time 5 s at 100 Hz → counter values 0..=500 descend, the
    // position tick that reads 501 terminates.
    while !core.failsafe().is_terminated() {
        assert!(
            core.failsafe().landing_ticks() <= 501,
            "descent exceeded its window"
        );
        core.run(&mut control, &mut setpoint, &state, tick);
        tick += 1;
    }

    assert_eq!(setpoint.mode.x, AxisMode::Disabled);
    assert_eq!(setpoint.mode.y, AxisMode::Disabled);
    assert_eq!(setpoint.mode.z, AxisMode::Disabled);
    assert_eq!(core.actuator_thrust(), 0.0);

    // With modes disabled and a zero manual thrust, the output is zero.
    core.run(&mut control, &mut setpoint, &state, tick);
    assert_eq!(control, Control::default());
}

/// S5: emergency stop bypasses distribution and freezes PID state.
#[test]
fn s5_emergency_stop() {
    let estimator = FixedStateEstimator {
        state: hover_state(),
    };
    let commander = FixedCommander {
        setpoint: hover_setpoint(),
    };
    let collaborators = Collaborators {
        sensors: ScriptedSensors::ready(),
        estimator,
        external_position: NoExternalPosition,
        commander,
        situation_awareness: PassthroughSitAw,
        power: CountingPower::default(),
    };
    let mut task = StabilizerTask::new(&StabilizerConfig::default(), collaborators).unwrap();

    task.run_unpaced(20);
    assert!(task.control().thrust > 0.0);

    task.set_emergency_stop();
    task.run_unpaced(10);

    let motors = task.motors();
    assert_eq!((motors.m1, motors.m2, motors.m3, motors.m4), (0, 0, 0, 0));
    assert_eq!(*task.control(), Control::default());
    assert_eq!(
        task.core().attitude_controller().rate_integrals(),
        (0.0, 0.0, 0.0)
    );
    assert_eq!(task.core().position_controller().integral_magnitude(), 0.0);
}

/// S6: velocity-mode roll override replaces the rate reference and clears
/// the roll attitude integrator on the same attitude tick.
#[test]
fn s6_velocity_override_resets_integrator() {
    let mut core = stock_core();
    let mut control = Control::default();
    let mut setpoint = Setpoint::default();
    setpoint.thrust = 30000;
    setpoint.attitude.roll = 20.0; // large attitude error builds the integrator
    let state = VehicleState::default();

    for tick in 1..=30 {
        core.run(&mut control, &mut setpoint, &state, tick);
    }
    assert!(core.attitude_controller().attitude_integrals().0 > 0.0);

    setpoint.mode.roll = AxisMode::Velocity;
    setpoint.attitude_rate.roll = 10.0;
    core.run(&mut control, &mut setpoint, &state, 32); // attitude tick

    assert_eq!(core.rate_desired().roll, 10.0);
    assert_eq!(core.attitude_controller().attitude_integrals().0, 0.0);
}

/// Emergency-stop reset re-arms the failsafe machine for a new flight.
#[test]
fn emergency_reset_rearms_failsafe() {
    let estimator = FixedStateEstimator {
        state: {
            let mut state = hover_state();
            state.failsafe = true;
            state
        },
    };
    let commander = FixedCommander {
        setpoint: hover_setpoint(),
    };
    let collaborators = Collaborators {
        sensors: ScriptedSensors::ready(),
        estimator,
        external_position: NoExternalPosition,
        commander,
        situation_awareness: PassthroughSitAw,
        power: CountingPower::default(),
    };
    let mut task = StabilizerTask::new(&StabilizerConfig::default(), collaborators).unwrap();

    task.run_unpaced(50);
    assert!(task.core().failsafe().is_engaged());

    task.reset_emergency_stop();
    assert_eq!(task.core().failsafe().phase(), DescentPhase::Idle);
}

/// The parameter surface drives tilt compensation and the failsafe trigger.
#[test]
fn params_observed_on_next_tick() {
    let estimator = FixedStateEstimator {
        state: {
            let mut state = VehicleState::default();
            state.tiltcomp = 0.5;
            state
        },
    };
    let commander = FixedCommander {
        setpoint: {
            let mut setpoint = Setpoint::default();
            setpoint.thrust = 20000;
            setpoint
        },
    };
    let collaborators = Collaborators {
        sensors: ScriptedSensors::ready(),
        estimator,
        external_position: NoExternalPosition,
        commander,
        situation_awareness: PassthroughSitAw,
        power: CountingPower::default(),
    };
    let mut task = StabilizerTask::new(&StabilizerConfig::default(), collaborators).unwrap();

    task.run_unpaced(4);
    assert_eq!(task.control().thrust, 40000.0); // tilt-compensated

    use strix_stabilizer::telemetry::ParamValue;
    assert!(task
        .params_mut()
        .set("controller.tiltComp", ParamValue::Bool(false)));
    task.run_unpaced(2);
    assert_eq!(task.control().thrust, 20000.0);

    // Manual failsafe trigger.
    assert!(task
        .params_mut()
        .set("controller.actFail", ParamValue::Bool(true)));
    task.run_unpaced(1);
    assert!(task.core().failsafe().is_engaged());
}

/// Telemetry snapshot mirrors the pipeline's scalar surface.
#[test]
fn snapshot_publishes_pipeline_fields() {
    let estimator = FixedStateEstimator {
        state: hover_state(),
    };
    let commander = FixedCommander {
        setpoint: {
            let mut setpoint = hover_setpoint();
            setpoint.attitude = Attitude::new(0.0, 0.0, 15.0);
            setpoint
        },
    };
    let collaborators = Collaborators {
        sensors: ScriptedSensors::ready(),
        estimator,
        external_position: NoExternalPosition,
        commander,
        situation_awareness: PassthroughSitAw,
        power: CountingPower::default(),
    };
    let mut task = StabilizerTask::new(&StabilizerConfig::default(), collaborators).unwrap();

    task.run_unpaced(10);
    let snapshot = task.snapshot();
    assert_eq!(snapshot.setpoint_position.z, 1.0);
    assert_eq!(snapshot.state_position.z, 1.0);
    assert_eq!(snapshot.control_thrust, task.control().thrust);
    assert_eq!(snapshot.attitude_desired.yaw, 15.0);
    assert_eq!(snapshot.setpoint_mode, [1, 1, 1, 1, 1, 1]);
    assert_eq!(snapshot.activate_failsafe, 0);
}
