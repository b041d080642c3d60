//! Cascaded attitude controller: an outer attitude loop producing per-axis
//! angular-rate references, and an inner rate loop producing actuator-domain
//! commands.
//!
//! Conventions at this boundary: all angles in degrees, rates in deg/s,
//! body frame with roll right / nose up / yaw left positive. The caller is
//! responsible for handing the inner loop a measured rate vector in the
//! controller's sign convention (see `interfaces::rate_pid_measured`).

use strix_common::config::AttitudeGains;
use strix_common::types::{AngularRate, Attitude, wrap_angle};

use super::pid::AxisPid;

/// Saturate a controller output into the signed 16-bit actuator domain.
#[inline]
fn saturate_i16(value: f32) -> i16 {
    value.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Outer attitude + inner rate PID pair for all three axes.
pub struct AttitudeController {
    roll_attitude: AxisPid,
    pitch_attitude: AxisPid,
    yaw_attitude: AxisPid,
    roll_rate: AxisPid,
    pitch_rate: AxisPid,
    yaw_rate: AxisPid,
    output_roll: i16,
    output_pitch: i16,
    output_yaw: i16,
}

impl AttitudeController {
    /// Create the controller with the given gains at the attitude-loop
    /// period `dt` [s].
    pub fn new(gains: &AttitudeGains, dt: f32) -> Self {
        Self {
            roll_attitude: AxisPid::new(gains.roll, dt),
            pitch_attitude: AxisPid::new(gains.pitch, dt),
            yaw_attitude: AxisPid::new(gains.yaw, dt),
            roll_rate: AxisPid::new(gains.roll_rate, dt),
            pitch_rate: AxisPid::new(gains.pitch_rate, dt),
            yaw_rate: AxisPid::new(gains.yaw_rate, dt),
            output_roll: 0,
            output_pitch: 0,
            output_yaw: 0,
        }
    }

    /// Outer loop: angular-rate references from the attitude error.
    ///
    /// The yaw error is wrapped into [-180, 180] before the PID so the
    /// vehicle always turns the short way around.
    pub fn correct_attitude_pid(&mut self, measured: &Attitude, desired: &Attitude) -> AngularRate {
        let yaw_error = wrap_angle(desired.yaw - measured.yaw);
        AngularRate {
            roll: self.roll_attitude.update(desired.roll - measured.roll),
            pitch: self.pitch_attitude.update(desired.pitch - measured.pitch),
            yaw: self.yaw_attitude.update(yaw_error),
        }
    }

    /// Inner loop: actuator commands from the rate error.
    ///
    /// `measured` is (roll, pitch, yaw) rate in the controller's sign
    /// convention. Outputs are latched and read via
    /// [`Self::actuator_output`].
    pub fn correct_rate_pid(&mut self, measured: (f32, f32, f32), desired: &AngularRate) {
        self.output_roll = saturate_i16(self.roll_rate.update(desired.roll - measured.0));
        self.output_pitch = saturate_i16(self.pitch_rate.update(desired.pitch - measured.1));
        self.output_yaw = saturate_i16(self.yaw_rate.update(desired.yaw - measured.2));
    }

    /// Latched inner-loop output: (roll, pitch, yaw) actuator commands.
    #[inline]
    pub const fn actuator_output(&self) -> (i16, i16, i16) {
        (self.output_roll, self.output_pitch, self.output_yaw)
    }

    /// Reset the roll attitude PID (velocity-mode override).
    #[inline]
    pub fn reset_roll_attitude_pid(&mut self) {
        self.roll_attitude.reset();
    }

    /// Reset the pitch attitude PID (velocity-mode override).
    #[inline]
    pub fn reset_pitch_attitude_pid(&mut self) {
        self.pitch_attitude.reset();
    }

    /// Reset every PID and clear the latched outputs.
    pub fn reset_all(&mut self) {
        self.roll_attitude.reset();
        self.pitch_attitude.reset();
        self.yaw_attitude.reset();
        self.roll_rate.reset();
        self.pitch_rate.reset();
        self.yaw_rate.reset();
        self.output_roll = 0;
        self.output_pitch = 0;
        self.output_yaw = 0;
    }

    /// Outer-loop integral accumulators (roll, pitch, yaw).
    #[inline]
    pub const fn attitude_integrals(&self) -> (f32, f32, f32) {
        (
            self.roll_attitude.integral(),
            self.pitch_attitude.integral(),
            self.yaw_attitude.integral(),
        )
    }

    /// Inner-loop integral accumulators (roll, pitch, yaw).
    #[inline]
    pub const fn rate_integrals(&self) -> (f32, f32, f32) {
        (
            self.roll_rate.integral(),
            self.pitch_rate.integral(),
            self.yaw_rate.integral(),
        )
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
