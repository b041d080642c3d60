//! Collaborator interfaces consumed by the core.
//!
//! Each trait is one external task's contract: the core calls these at fixed
//! points in the tick and never blocks on them. Implementations write their
//! records in place; the core's reads are single-threaded snapshots.

use strix_common::types::{Control, MotorCmds, SensorData, Setpoint, Vector3, VehicleState};

/// Sensor acquisition and calibration gate.
pub trait SensorSource {
    /// Populate the sensor record for this tick.
    fn acquire(&mut self, sensors: &mut SensorData, tick: u32);

    /// Calibration gate checked before the loop starts.
    fn calibrated(&self) -> bool;

    /// Power-on self test.
    fn self_test(&mut self) -> bool {
        true
    }
}

/// State estimator (complementary or Kalman — an implementor concern).
pub trait Estimator {
    /// Update the state estimate from the latest sensors and the previous
    /// tick's control output.
    fn estimate(
        &mut self,
        state: &mut VehicleState,
        sensors: &SensorData,
        control: &Control,
        motors: &MotorCmds,
        tick: u32,
    );

    fn self_test(&mut self) -> bool {
        true
    }
}

/// Externally provided position overlay (e.g. motion capture).
pub trait ExternalPositionSource {
    /// Overlay an external position onto the state, if one is available.
    fn overlay(&mut self, state: &mut VehicleState);
}

/// Commanded-setpoint source. Responsible for degrading modes toward safe
/// defaults on command-link timeouts.
pub trait Commander {
    fn get_setpoint(&mut self, setpoint: &mut Setpoint, state: &VehicleState);
}

/// Situation-awareness hook; may override the setpoint on detected
/// conditions (e.g. tumble).
pub trait SituationAwareness {
    fn update_setpoint(
        &mut self,
        setpoint: &mut Setpoint,
        sensors: &SensorData,
        state: &VehicleState,
    );
}

/// Power distribution: maps the control vector onto motor commands.
pub trait PowerDistributor {
    fn distribute(&mut self, control: &Control, motors: &mut MotorCmds);

    /// Stop all motors immediately.
    fn stop(&mut self, motors: &mut MotorCmds);

    fn self_test(&mut self) -> bool {
        true
    }
}

/// Estimator-to-controller adapter for the inner rate loop.
///
/// The rate PID's pitch axis uses the opposite sign from the gyro's body-y
/// axis: positive pitch-rate (nose rising) and positive body-y angular
/// velocity disagree in this frame. The negation lives here, at the
/// boundary, not inside the controller.
#[inline]
pub fn rate_pid_measured(angular_vel: &Vector3) -> (f32, f32, f32) {
    (angular_vel.x, -angular_vel.y, angular_vel.z)
}
