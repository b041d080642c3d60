//! Position and velocity controller: maps world-frame position or velocity
//! error onto a thrust command and a roll/pitch attitude reference.
//!
//! Conventions at this boundary: world frame x forward / y left / z up,
//! attitude roll right / nose up positive. Forward error therefore commands
//! nose-down (negative pitch) and leftward error commands roll-left
//! (negative roll). Output thrust is in raw actuator units around
//! `thrust_base`, clamped to [0, THRUST_MAX].

use strix_common::config::PositionGains;
use strix_common::consts::THRUST_MAX;
use strix_common::types::{Setpoint, VehicleState};

use super::pid::AxisPid;

/// Thrust and attitude reference produced by one position-stage step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionOutput {
    /// Raw thrust [0, THRUST_MAX].
    pub thrust: f32,
    /// Roll reference [deg].
    pub roll: f32,
    /// Pitch reference [deg].
    pub pitch: f32,
}

/// Closed-loop position/velocity controller.
pub struct PositionController {
    x_pid: AxisPid,
    y_pid: AxisPid,
    z_pid: AxisPid,
    vx_pid: AxisPid,
    vy_pid: AxisPid,
    vz_pid: AxisPid,
    thrust_base: f32,
    thrust_scale: f32,
    rp_limit: f32,
}

impl PositionController {
    /// Create the controller at the position-loop period `dt` [s].
    pub fn new(gains: &PositionGains, dt: f32) -> Self {
        Self {
            x_pid: AxisPid::new(gains.xy, dt),
            y_pid: AxisPid::new(gains.xy, dt),
            z_pid: AxisPid::new(gains.z, dt),
            vx_pid: AxisPid::new(gains.vxy, dt),
            vy_pid: AxisPid::new(gains.vxy, dt),
            vz_pid: AxisPid::new(gains.vz, dt),
            thrust_base: gains.thrust_base,
            thrust_scale: gains.thrust_scale,
            rp_limit: gains.rp_limit,
        }
    }

    /// Absolute-mode step: position error → thrust + attitude reference.
    pub fn step(&mut self, setpoint: &Setpoint, state: &VehicleState) -> PositionOutput {
        let dx = setpoint.position.x - state.position.x;
        let dy = setpoint.position.y - state.position.y;
        let dz = setpoint.position.z - state.position.z;

        // Rotate the horizontal error into the body frame by the current yaw.
        let yaw = state.attitude.yaw.to_radians();
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        let body_x = dx * cos_yaw + dy * sin_yaw;
        let body_y = -dx * sin_yaw + dy * cos_yaw;

        let pitch = (-self.x_pid.update(body_x)).clamp(-self.rp_limit, self.rp_limit);
        let roll = (-self.y_pid.update(body_y)).clamp(-self.rp_limit, self.rp_limit);
        let z_out = self.z_pid.update(dz);
        let thrust = self.project_thrust(z_out);

        PositionOutput {
            thrust,
            roll,
            pitch,
        }
    }

    /// Velocity-mode step: same output contract, velocity error input.
    pub fn step_velocity(&mut self, setpoint: &Setpoint, state: &VehicleState) -> PositionOutput {
        let dvx = setpoint.velocity.x - state.velocity.x;
        let dvy = setpoint.velocity.y - state.velocity.y;
        let dvz = setpoint.velocity.z - state.velocity.z;

        let yaw = state.attitude.yaw.to_radians();
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        let body_vx = dvx * cos_yaw + dvy * sin_yaw;
        let body_vy = -dvx * sin_yaw + dvy * cos_yaw;

        let pitch = (-self.vx_pid.update(body_vx)).clamp(-self.rp_limit, self.rp_limit);
        let roll = (-self.vy_pid.update(body_vy)).clamp(-self.rp_limit, self.rp_limit);
        let vz_out = self.vz_pid.update(dvz);
        let thrust = self.project_thrust(vz_out);

        PositionOutput {
            thrust,
            roll,
            pitch,
        }
    }

    #[inline]
    fn project_thrust(&self, vertical_out: f32) -> f32 {
        (self.thrust_base + vertical_out * self.thrust_scale).clamp(0.0, THRUST_MAX)
    }

    /// Reset every PID.
    pub fn reset_all(&mut self) {
        self.x_pid.reset();
        self.y_pid.reset();
        self.z_pid.reset();
        self.vx_pid.reset();
        self.vy_pid.reset();
        self.vz_pid.reset();
    }

    /// Sum of the absolute values of every integral accumulator.
    pub fn integral_magnitude(&self) -> f32 {
        self.x_pid.integral().abs()
            + self.y_pid.integral().abs()
            + self.z_pid.integral().abs()
            + self.vx_pid.integral().abs()
            + self.vy_pid.integral().abs()
            + self.vz_pid.integral().abs()
    }

    /// Configured hover thrust offset.
    #[inline]
    pub const fn thrust_base(&self) -> f32 {
        self.thrust_base
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use strix_common::types::Vector3;

    const DT: f32 = 0.01; // 100 Hz position loop

    fn controller() -> PositionController {
        PositionController::new(&PositionGains::default(), DT)
    }

    #[test]
    fn hover_at_target_outputs_base_thrust_and_level() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(0.0, 0.0, 1.0);
        let mut state = VehicleState::default();
        state.position = Vector3::new(0.0, 0.0, 1.0);

        let out = ctrl.step(&setpoint, &state);
        assert_eq!(out.thrust, ctrl.thrust_base());
        assert_eq!(out.roll, 0.0);
        assert_eq!(out.pitch, 0.0);
    }

    #[test]
    fn altitude_error_raises_thrust() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(0.0, 0.0, 2.0);
        let state = VehicleState::default(); // at z = 0

        let out = ctrl.step(&setpoint, &state);
        assert!(out.thrust > ctrl.thrust_base());
        assert!(out.thrust <= THRUST_MAX);
    }

    #[test]
    fn forward_error_commands_nose_down() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(1.0, 0.0, 0.0);
        let state = VehicleState::default(); // level, yaw 0

        let out = ctrl.step(&setpoint, &state);
        assert!(out.pitch < 0.0);
        assert_eq!(out.roll, 0.0);
    }

    #[test]
    fn attitude_reference_respects_limit() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(100.0, -100.0, 0.0);
        let state = VehicleState::default();

        let out = ctrl.step(&setpoint, &state);
        let limit = PositionGains::default().rp_limit;
        assert!(out.pitch.abs() <= limit);
        assert!(out.roll.abs() <= limit);
    }

    #[test]
    fn yaw_rotation_maps_world_error_to_body_axes() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(1.0, 0.0, 0.0);
        let mut state = VehicleState::default();
        // Facing +90 deg (left): a world +x error is now to the body's right,
        // so the controller should roll right, not pitch.
        state.attitude.yaw = 90.0;

        let out = ctrl.step(&setpoint, &state);
        assert!(out.roll > 0.0, "expected roll right, got {}", out.roll);
        assert!(out.pitch.abs() < 1e-3);
    }

    #[test]
    fn velocity_step_tracks_climb_command() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.velocity = Vector3::new(0.0, 0.0, 1.0);
        let state = VehicleState::default();

        let out = ctrl.step_velocity(&setpoint, &state);
        assert!(out.thrust > ctrl.thrust_base());
    }

    #[test]
    fn reset_all_clears_integrals() {
        let mut ctrl = controller();
        let mut setpoint = Setpoint::default();
        setpoint.position = Vector3::new(1.0, 1.0, 1.0);
        let state = VehicleState::default();
        for _ in 0..50 {
            ctrl.step(&setpoint, &state);
        }
        assert!(ctrl.integral_magnitude() > 0.0);
        ctrl.reset_all();
        assert_eq!(ctrl.integral_magnitude(), 0.0);
    }
}
