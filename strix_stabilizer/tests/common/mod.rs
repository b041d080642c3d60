//! Scripted collaborators for end-to-end pipeline tests.

use strix_common::types::{Control, MotorCmds, SensorData, Setpoint, VehicleState};
use strix_stabilizer::interfaces::{
    Commander, Estimator, ExternalPositionSource, PowerDistributor, SensorSource,
    SituationAwareness,
};

/// Sensor source with a controllable calibration gate and static readings.
pub struct ScriptedSensors {
    pub calibrated: bool,
    pub data: SensorData,
}

impl ScriptedSensors {
    pub fn ready() -> Self {
        Self {
            calibrated: true,
            data: SensorData::default(),
        }
    }
}

impl SensorSource for ScriptedSensors {
    fn acquire(&mut self, sensors: &mut SensorData, _tick: u32) {
        *sensors = self.data;
    }

    fn calibrated(&self) -> bool {
        self.calibrated
    }
}

/// Estimator that publishes a fixed state every tick.
pub struct FixedStateEstimator {
    pub state: VehicleState,
}

impl Estimator for FixedStateEstimator {
    fn estimate(
        &mut self,
        state: &mut VehicleState,
        _sensors: &SensorData,
        _control: &Control,
        _motors: &MotorCmds,
        _tick: u32,
    ) {
        *state = self.state;
    }
}

/// No external position system.
pub struct NoExternalPosition;

impl ExternalPositionSource for NoExternalPosition {
    fn overlay(&mut self, _state: &mut VehicleState) {}
}

/// Commander that repeats a fixed setpoint.
pub struct FixedCommander {
    pub setpoint: Setpoint,
}

impl Commander for FixedCommander {
    fn get_setpoint(&mut self, setpoint: &mut Setpoint, _state: &VehicleState) {
        *setpoint = self.setpoint;
    }
}

/// Situation awareness that never intervenes.
pub struct PassthroughSitAw;

impl SituationAwareness for PassthroughSitAw {
    fn update_setpoint(
        &mut self,
        _setpoint: &mut Setpoint,
        _sensors: &SensorData,
        _state: &VehicleState,
    ) {
    }
}

/// Power distributor that records how it was driven. Distribution writes the
/// thrust onto all four motors; stop zeroes them.
#[derive(Default)]
pub struct CountingPower {
    pub distribute_calls: u32,
    pub stop_calls: u32,
}

impl PowerDistributor for CountingPower {
    fn distribute(&mut self, control: &Control, motors: &mut MotorCmds) {
        self.distribute_calls += 1;
        let thrust = control.thrust.clamp(0.0, 65535.0) as u16;
        motors.m1 = thrust;
        motors.m2 = thrust;
        motors.m3 = thrust;
        motors.m4 = thrust;
    }

    fn stop(&mut self, motors: &mut MotorCmds) {
        self.stop_calls += 1;
        *motors = MotorCmds::default();
    }
}
