//! Cascaded controller orchestrator.
//!
//! One owned value runs the three nested loops in strict order per main
//! tick: position stage (slow) → attitude + rate stage (medium/fast) →
//! thrust projection (every tick). The failsafe descent machine takes over
//! the position stage while latched; manual per-axis modes override the
//! closed-loop references.

use strix_common::config::StabilizerConfig;
use strix_common::consts::{THRUST_MAX, TILT_COMP_EPSILON};
use strix_common::error::{ConfigValidationError, FaultFlags};
use strix_common::types::{AngularRate, Attitude, AxisMode, Control, Setpoint, VehicleState};

use crate::control::position::PositionOutput;
use crate::control::{AttitudeController, PositionController};
use crate::interfaces::rate_pid_measured;
use crate::resolver::{SetpointResolver, manual_roll_pitch};
use crate::safety::failsafe::{DescentCommand, DescentPhase};
use crate::safety::FailsafeMachine;
use crate::sched::RateDividers;

/// The stabilization core: controller state, failsafe latch and the
/// per-tick stage dispatch.
pub struct StabilizerCore {
    rates: RateDividers,
    resolver: SetpointResolver,
    attitude_ctrl: AttitudeController,
    position_ctrl: PositionController,
    failsafe: FailsafeMachine,
    attitude_desired: Attitude,
    rate_desired: AngularRate,
    actuator_thrust: f32,
    tilt_comp_enabled: bool,
    flags: FaultFlags,
}

impl StabilizerCore {
    /// Build the core from a validated configuration.
    pub fn new(config: &StabilizerConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        let rates = RateDividers::new(&config.rates)?;
        let attitude_dt = rates.attitude_dt();
        let position_dt = 1.0 / rates.position_hz() as f32;

        Ok(Self {
            rates,
            resolver: SetpointResolver::new(attitude_dt),
            attitude_ctrl: AttitudeController::new(&config.attitude, attitude_dt),
            position_ctrl: PositionController::new(&config.position, position_dt),
            failsafe: FailsafeMachine::new(config.failsafe, rates.position_hz()),
            attitude_desired: Attitude::default(),
            rate_desired: AngularRate::default(),
            actuator_thrust: 0.0,
            tilt_comp_enabled: config.tilt_comp,
            flags: FaultFlags::empty(),
        })
    }

    /// Run the controller pipeline for one main tick.
    ///
    /// `setpoint` is mutable because failsafe termination forces the x/y/z
    /// modes to Disabled.
    pub fn run(
        &mut self,
        control: &mut Control,
        setpoint: &mut Setpoint,
        state: &VehicleState,
        tick: u32,
    ) {
        self.flags
            .set(FaultFlags::ESTIMATOR_FAILSAFE, state.failsafe);

        if self.rates.attitude_due(tick) {
            self.attitude_desired.yaw = self
                .resolver
                .resolve_yaw(self.attitude_desired.yaw, setpoint);
        }

        if self.rates.position_due(tick) {
            self.position_stage(control.thrust, setpoint, state);
        }

        if self.rates.attitude_due(tick) {
            self.attitude_stage(control, setpoint, state);
        }

        self.project_thrust(control, state);
    }

    /// Position stage, at position rate.
    fn position_stage(&mut self, current_thrust: f32, setpoint: &mut Setpoint, state: &VehicleState) {
        match setpoint.mode.z {
            AxisMode::Absolute => {
                if state.failsafe {
                    self.failsafe.engage();
                }
                match self.failsafe.tick(current_thrust) {
                    DescentCommand::Descend {
                        thrust,
                        roll,
                        pitch,
                    } => {
                        self.attitude_desired.roll = roll;
                        self.attitude_desired.pitch = pitch;
                        self.actuator_thrust = thrust;
                    }
                    DescentCommand::Terminate => {
                        self.actuator_thrust = 0.0;
                        setpoint.mode.x = AxisMode::Disabled;
                        setpoint.mode.y = AxisMode::Disabled;
                        setpoint.mode.z = AxisMode::Disabled;
                    }
                    DescentCommand::None => {
                        self.failsafe.reset_landing_counter();
                        let out = self.position_ctrl.step(setpoint, state);
                        self.apply_position_output(out);
                    }
                }
            }
            AxisMode::Velocity => {
                let out = self.position_ctrl.step_velocity(setpoint, state);
                self.apply_position_output(out);
            }
            // Thrust is taken from the raw setpoint in the attitude stage.
            AxisMode::Disabled => {}
        }
    }

    #[inline]
    fn apply_position_output(&mut self, out: PositionOutput) {
        self.actuator_thrust = out.thrust;
        self.attitude_desired.roll = out.roll;
        self.attitude_desired.pitch = out.pitch;
    }

    /// Attitude + rate stage, at attitude rate.
    fn attitude_stage(&mut self, control: &mut Control, setpoint: &Setpoint, state: &VehicleState) {
        if setpoint.mode.z == AxisMode::Disabled {
            self.actuator_thrust = f32::from(setpoint.thrust);
        }
        if let Some((roll, pitch)) = manual_roll_pitch(setpoint) {
            self.attitude_desired.roll = roll;
            self.attitude_desired.pitch = pitch;
        }

        self.rate_desired = self
            .attitude_ctrl
            .correct_attitude_pid(&state.attitude, &self.attitude_desired);

        // A velocity-mode roll/pitch command bypasses the outer loop; its
        // attitude integrator is cleared so stale error cannot destabilize
        // a later return to level mode.
        if setpoint.mode.roll == AxisMode::Velocity {
            self.rate_desired.roll = setpoint.attitude_rate.roll;
            self.attitude_ctrl.reset_roll_attitude_pid();
        }
        if setpoint.mode.pitch == AxisMode::Velocity {
            self.rate_desired.pitch = setpoint.attitude_rate.pitch;
            self.attitude_ctrl.reset_pitch_attitude_pid();
        }

        self.attitude_ctrl
            .correct_rate_pid(rate_pid_measured(&state.angular_vel), &self.rate_desired);

        let (roll, pitch, yaw) = self.attitude_ctrl.actuator_output();
        control.roll = roll;
        control.pitch = pitch;
        // Actuator convention: yaw torque is inverted.
        control.yaw = yaw.saturating_neg();
    }

    /// Thrust projection, every tick.
    fn project_thrust(&mut self, control: &mut Control, state: &VehicleState) {
        control.thrust = if self.tilt_comp_enabled {
            let tilt = state.tiltcomp.max(TILT_COMP_EPSILON);
            self.flags
                .set(FaultFlags::TILT_CLAMPED, state.tiltcomp < TILT_COMP_EPSILON);
            (self.actuator_thrust / tilt).min(THRUST_MAX)
        } else {
            // The singularity is not evaluated while compensation is off.
            self.flags.remove(FaultFlags::TILT_CLAMPED);
            self.actuator_thrust
        };

        if control.thrust == 0.0 {
            control.zero();
            self.attitude_ctrl.reset_all();
            self.position_ctrl.reset_all();
            // A grounded vehicle must not accumulate a yaw reference.
            self.attitude_desired.yaw = state.attitude.yaw;
        }

        self.flags.set(
            FaultFlags::FAILSAFE_DESCENT,
            self.failsafe.phase() == DescentPhase::Active,
        );
        self.flags
            .set(FaultFlags::FAILSAFE_TERMINATED, self.failsafe.is_terminated());
    }

    /// Emergency-stop override: zero the control vector and every
    /// controller state, snap the yaw reference to the measured yaw.
    pub fn on_emergency_stop(&mut self, control: &mut Control, state: &VehicleState) {
        control.zero();
        self.actuator_thrust = 0.0;
        self.attitude_ctrl.reset_all();
        self.position_ctrl.reset_all();
        self.attitude_desired.yaw = state.attitude.yaw;
    }

    /// Record the emergency-stop latch state in the fault flags.
    #[inline]
    pub fn set_emergency_fault(&mut self, stopped: bool) {
        self.flags.set(FaultFlags::EMERGENCY_STOP, stopped);
    }

    // ── Accessors ──

    #[inline]
    pub const fn rates(&self) -> &RateDividers {
        &self.rates
    }

    #[inline]
    pub const fn attitude_desired(&self) -> Attitude {
        self.attitude_desired
    }

    #[inline]
    pub const fn rate_desired(&self) -> AngularRate {
        self.rate_desired
    }

    #[inline]
    pub const fn actuator_thrust(&self) -> f32 {
        self.actuator_thrust
    }

    #[inline]
    pub const fn failsafe(&self) -> &FailsafeMachine {
        &self.failsafe
    }

    #[inline]
    pub fn failsafe_mut(&mut self) -> &mut FailsafeMachine {
        &mut self.failsafe
    }

    #[inline]
    pub const fn attitude_controller(&self) -> &AttitudeController {
        &self.attitude_ctrl
    }

    #[inline]
    pub const fn position_controller(&self) -> &PositionController {
        &self.position_ctrl
    }

    #[inline]
    pub const fn flags(&self) -> FaultFlags {
        self.flags
    }

    #[inline]
    pub fn set_tilt_comp(&mut self, enabled: bool) {
        self.tilt_comp_enabled = enabled;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
