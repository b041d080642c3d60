//! Simulation collaborators: a kinematic toy vehicle and trivial command
//! sources so the stabilizer binary runs standalone on a dev host.
//!
//! The physics here is deliberately crude — first-order responses with
//! hand-picked scale factors. It exists to exercise the pipeline end to
//! end, not to model a vehicle.

use strix_common::consts::THRUST_MAX;
use strix_common::types::{
    AxisMode, Control, MotorCmds, SensorData, Setpoint, SetpointMode, Vector3, VehicleState,
    wrap_angle,
};

use crate::interfaces::{
    Commander, Estimator, ExternalPositionSource, PowerDistributor, SensorSource,
    SituationAwareness,
};

/// Sensor source that reports calibrated after a wall-clock warm-up, the
/// way a concurrently-sampling sensor task would.
pub struct SimSensors {
    ready_at: std::time::Instant,
}

impl SimSensors {
    pub fn new(warmup: std::time::Duration) -> Self {
        Self {
            ready_at: std::time::Instant::now() + warmup,
        }
    }
}

impl SensorSource for SimSensors {
    fn acquire(&mut self, sensors: &mut SensorData, _tick: u32) {
        // Gravity on the accelerometer z axis; other channels idle.
        sensors.acc = Vector3::new(0.0, 0.0, 1.0);
        sensors.baro.pressure = 1013.25;
        sensors.baro.temperature = 21.0;
    }

    fn calibrated(&self) -> bool {
        std::time::Instant::now() >= self.ready_at
    }
}

/// Kinematic estimator: integrates the previous control output into an
/// attitude/altitude state with first-order responses.
pub struct SimEstimator {
    dt: f32,
}

impl SimEstimator {
    /// `main_hz` is the loop rate the estimator integrates at.
    pub fn new(main_hz: u32) -> Self {
        Self {
            dt: 1.0 / main_hz as f32,
        }
    }
}

/// Actuator command to body-rate response [deg/s per count].
const RATE_RESPONSE: f32 = 0.02;
/// Thrust offset from hover to climb rate [m/s per raw unit].
const CLIMB_RESPONSE: f32 = 0.0001;
/// Raw thrust that balances gravity in this toy model.
const HOVER_THRUST: f32 = 36000.0;

impl Estimator for SimEstimator {
    fn estimate(
        &mut self,
        state: &mut VehicleState,
        sensors: &SensorData,
        control: &Control,
        _motors: &MotorCmds,
        _tick: u32,
    ) {
        // Body rates follow the actuator commands.
        state.angular_vel.x = f32::from(control.roll) * RATE_RESPONSE;
        state.angular_vel.y = f32::from(control.pitch) * RATE_RESPONSE;
        state.angular_vel.z = f32::from(control.yaw) * RATE_RESPONSE;

        state.attitude.roll += state.angular_vel.x * self.dt;
        state.attitude.pitch += state.angular_vel.y * self.dt;
        state.attitude.yaw = wrap_angle(state.attitude.yaw + state.angular_vel.z * self.dt);

        // Altitude follows thrust around the hover point while airborne.
        if control.thrust > 0.0 {
            state.velocity.z = (control.thrust - HOVER_THRUST) * CLIMB_RESPONSE;
        } else {
            state.velocity.z = 0.0;
        }
        state.position.z = (state.position.z + state.velocity.z * self.dt).max(0.0);

        // Level-flight tilt cosine from the small-angle attitude.
        let roll = state.attitude.roll.to_radians();
        let pitch = state.attitude.pitch.to_radians();
        state.tiltcomp = (roll.cos() * pitch.cos()).max(0.1);
        state.acceleration = sensors.acc;
    }
}

/// No external position system attached.
pub struct NoExternalPosition;

impl ExternalPositionSource for NoExternalPosition {
    fn overlay(&mut self, _state: &mut VehicleState) {}
}

/// Commander holding a fixed absolute hover setpoint.
pub struct HoverCommander {
    pub altitude: f32,
}

impl Commander for HoverCommander {
    fn get_setpoint(&mut self, setpoint: &mut Setpoint, _state: &VehicleState) {
        setpoint.mode = SetpointMode::uniform(AxisMode::Absolute);
        setpoint.mode.roll = AxisMode::Disabled;
        setpoint.mode.pitch = AxisMode::Disabled;
        setpoint.position = Vector3::new(0.0, 0.0, self.altitude);
        setpoint.attitude.yaw = 0.0;
    }
}

/// Situation-awareness hook that never intervenes.
pub struct PassthroughSituationAwareness;

impl SituationAwareness for PassthroughSituationAwareness {
    fn update_setpoint(
        &mut self,
        _setpoint: &mut Setpoint,
        _sensors: &SensorData,
        _state: &VehicleState,
    ) {
    }
}

/// Quad-X mixer: thrust plus differential roll/pitch/yaw onto four motors.
pub struct QuadXMixer;

#[inline]
fn to_motor(value: f32) -> u16 {
    value.clamp(0.0, THRUST_MAX) as u16
}

impl PowerDistributor for QuadXMixer {
    fn distribute(&mut self, control: &Control, motors: &mut MotorCmds) {
        let thrust = control.thrust;
        let roll = f32::from(control.roll) / 2.0;
        let pitch = f32::from(control.pitch) / 2.0;
        let yaw = f32::from(control.yaw);

        motors.m1 = to_motor(thrust - roll + pitch + yaw);
        motors.m2 = to_motor(thrust - roll - pitch - yaw);
        motors.m3 = to_motor(thrust + roll - pitch + yaw);
        motors.m4 = to_motor(thrust + roll + pitch - yaw);
    }

    fn stop(&mut self, motors: &mut MotorCmds) {
        *motors = MotorCmds::default();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
