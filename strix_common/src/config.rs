//! Configuration structures for the stabilization core.
//!
//! All config types use `serde::Deserialize` for TOML loading. Optional
//! fields use `#[serde(default)]` so a partial file deserializes against the
//! stock tuning. Numeric parameters are checked against the bounds in
//! [`crate::consts`] by `validate()`.

use serde::{Deserialize, Serialize};

use crate::consts::{
    ATTITUDE_HZ_DEFAULT, FAILSAFE_PITCH_BASE_DEFAULT, FAILSAFE_ROLL_BASE_DEFAULT,
    FAILSAFE_THRUST_STEP_DEFAULT, LANDING_THRUST_DEFAULT, LANDING_TIME_S_DEFAULT, MAIN_HZ_DEFAULT,
    MAIN_HZ_MAX, MAIN_HZ_MIN, POSITION_HZ_DEFAULT, THRUST_MAX,
};
use crate::error::ConfigValidationError;

// ─── Rate Hierarchy ─────────────────────────────────────────────────

/// Main / attitude / position loop rates [Hz].
///
/// The chain must divide evenly: `main_hz % attitude_hz == 0` and
/// `attitude_hz % position_hz == 0`. A misconfigured triple is rejected by
/// `validate()` before a scheduler can be built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLoopConfig {
    #[serde(default = "default_main_hz")]
    pub main_hz: u32,
    #[serde(default = "default_attitude_hz")]
    pub attitude_hz: u32,
    #[serde(default = "default_position_hz")]
    pub position_hz: u32,
}

fn default_main_hz() -> u32 {
    MAIN_HZ_DEFAULT
}
fn default_attitude_hz() -> u32 {
    ATTITUDE_HZ_DEFAULT
}
fn default_position_hz() -> u32 {
    POSITION_HZ_DEFAULT
}

impl Default for RateLoopConfig {
    fn default() -> Self {
        Self {
            main_hz: default_main_hz(),
            attitude_hz: default_attitude_hz(),
            position_hz: default_position_hz(),
        }
    }
}

impl RateLoopConfig {
    /// Validate bounds and the integer-divisor chain.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.main_hz < MAIN_HZ_MIN || self.main_hz > MAIN_HZ_MAX {
            return Err(ConfigValidationError::OutOfRange {
                field: "main_hz",
                value: self.main_hz as f64,
                min: MAIN_HZ_MIN as f64,
                max: MAIN_HZ_MAX as f64,
            });
        }
        if self.attitude_hz == 0 {
            return Err(ConfigValidationError::NotPositive {
                field: "attitude_hz",
                value: 0.0,
            });
        }
        if self.position_hz == 0 {
            return Err(ConfigValidationError::NotPositive {
                field: "position_hz",
                value: 0.0,
            });
        }
        if self.main_hz % self.attitude_hz != 0 {
            return Err(ConfigValidationError::NonIntegerDivisor {
                outer_name: "main_hz",
                outer_hz: self.main_hz,
                inner_name: "attitude_hz",
                inner_hz: self.attitude_hz,
            });
        }
        if self.attitude_hz % self.position_hz != 0 {
            return Err(ConfigValidationError::NonIntegerDivisor {
                outer_name: "attitude_hz",
                outer_hz: self.attitude_hz,
                inner_name: "position_hz",
                inner_hz: self.position_hz,
            });
        }
        Ok(())
    }
}

// ─── Failsafe Descent ───────────────────────────────────────────────

/// Controlled-descent parameters for the failsafe state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailsafeConfig {
    /// Thrust held during descent [raw units].
    #[serde(default = "default_landing_thrust")]
    pub landing_thrust: f32,
    /// Maximum descent duration [s].
    #[serde(default = "default_landing_time_s")]
    pub landing_time_s: f32,
    /// Fixed roll reference held during descent [deg].
    #[serde(default = "default_roll_base")]
    pub roll_base: f32,
    /// Fixed pitch reference held during descent [deg].
    #[serde(default = "default_pitch_base")]
    pub pitch_base: f32,
    /// Thrust-decay probe step [raw units].
    #[serde(default = "default_thrust_step")]
    pub thrust_step: f32,
}

fn default_landing_thrust() -> f32 {
    LANDING_THRUST_DEFAULT
}
fn default_landing_time_s() -> f32 {
    LANDING_TIME_S_DEFAULT
}
fn default_roll_base() -> f32 {
    FAILSAFE_ROLL_BASE_DEFAULT
}
fn default_pitch_base() -> f32 {
    FAILSAFE_PITCH_BASE_DEFAULT
}
fn default_thrust_step() -> f32 {
    FAILSAFE_THRUST_STEP_DEFAULT
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        Self {
            landing_thrust: default_landing_thrust(),
            landing_time_s: default_landing_time_s(),
            roll_base: default_roll_base(),
            pitch_base: default_pitch_base(),
            thrust_step: default_thrust_step(),
        }
    }
}

impl FailsafeConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.landing_thrust <= 0.0 || self.landing_thrust > THRUST_MAX {
            return Err(ConfigValidationError::OutOfRange {
                field: "landing_thrust",
                value: self.landing_thrust as f64,
                min: 0.0,
                max: THRUST_MAX as f64,
            });
        }
        if self.landing_time_s <= 0.0 {
            return Err(ConfigValidationError::NotPositive {
                field: "landing_time_s",
                value: self.landing_time_s as f64,
            });
        }
        if self.thrust_step <= 0.0 {
            return Err(ConfigValidationError::NotPositive {
                field: "thrust_step",
                value: self.thrust_step as f64,
            });
        }
        Ok(())
    }
}

// ─── Controller Gains ───────────────────────────────────────────────

/// Gains of one PID axis. Zero Ki disables integral; zero Kd disables
/// derivative. The integral accumulator is clamped to ±`integral_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    #[serde(default)]
    pub kp: f32,
    #[serde(default)]
    pub ki: f32,
    #[serde(default)]
    pub kd: f32,
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f32,
}

fn default_integral_limit() -> f32 {
    5000.0
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            integral_limit: default_integral_limit(),
        }
    }
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32, integral_limit: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit,
        }
    }
}

/// Outer attitude and inner rate loop gains, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeGains {
    #[serde(default = "default_roll_attitude")]
    pub roll: PidGains,
    #[serde(default = "default_pitch_attitude")]
    pub pitch: PidGains,
    #[serde(default = "default_yaw_attitude")]
    pub yaw: PidGains,
    #[serde(default = "default_roll_rate")]
    pub roll_rate: PidGains,
    #[serde(default = "default_pitch_rate")]
    pub pitch_rate: PidGains,
    #[serde(default = "default_yaw_rate")]
    pub yaw_rate: PidGains,
}

fn default_roll_attitude() -> PidGains {
    PidGains::new(6.0, 3.0, 0.0, 20.0)
}
fn default_pitch_attitude() -> PidGains {
    PidGains::new(6.0, 3.0, 0.0, 20.0)
}
fn default_yaw_attitude() -> PidGains {
    PidGains::new(6.0, 1.0, 0.35, 360.0)
}
fn default_roll_rate() -> PidGains {
    PidGains::new(250.0, 500.0, 2.5, 33.3)
}
fn default_pitch_rate() -> PidGains {
    PidGains::new(250.0, 500.0, 2.5, 33.3)
}
fn default_yaw_rate() -> PidGains {
    PidGains::new(120.0, 16.7, 0.0, 166.7)
}

impl Default for AttitudeGains {
    fn default() -> Self {
        Self {
            roll: default_roll_attitude(),
            pitch: default_pitch_attitude(),
            yaw: default_yaw_attitude(),
            roll_rate: default_roll_rate(),
            pitch_rate: default_pitch_rate(),
            yaw_rate: default_yaw_rate(),
        }
    }
}

/// Position/velocity controller gains and thrust mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionGains {
    /// Horizontal position loop (applied per body axis).
    #[serde(default = "default_xy")]
    pub xy: PidGains,
    /// Vertical position loop.
    #[serde(default = "default_z")]
    pub z: PidGains,
    /// Horizontal velocity loop (velocity mode).
    #[serde(default = "default_vxy")]
    pub vxy: PidGains,
    /// Vertical velocity loop (velocity mode).
    #[serde(default = "default_vz")]
    pub vz: PidGains,
    /// Hover thrust offset [raw units].
    #[serde(default = "default_thrust_base")]
    pub thrust_base: f32,
    /// Vertical-loop output to raw-thrust scale.
    #[serde(default = "default_thrust_scale")]
    pub thrust_scale: f32,
    /// Roll/pitch reference saturation [deg].
    #[serde(default = "default_rp_limit")]
    pub rp_limit: f32,
}

fn default_xy() -> PidGains {
    PidGains::new(25.0, 1.0, 0.0, 5.0)
}
fn default_z() -> PidGains {
    PidGains::new(30.0, 15.0, 0.0, 10.0)
}
fn default_vxy() -> PidGains {
    PidGains::new(20.0, 0.5, 0.0, 5.0)
}
fn default_vz() -> PidGains {
    PidGains::new(25.0, 15.0, 0.0, 10.0)
}
fn default_thrust_base() -> f32 {
    36000.0
}
fn default_thrust_scale() -> f32 {
    1000.0
}
fn default_rp_limit() -> f32 {
    20.0
}

impl Default for PositionGains {
    fn default() -> Self {
        Self {
            xy: default_xy(),
            z: default_z(),
            vxy: default_vxy(),
            vz: default_vz(),
            thrust_base: default_thrust_base(),
            thrust_scale: default_thrust_scale(),
            rp_limit: default_rp_limit(),
        }
    }
}

impl PositionGains {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.thrust_base < 0.0 || self.thrust_base > THRUST_MAX {
            return Err(ConfigValidationError::OutOfRange {
                field: "thrust_base",
                value: self.thrust_base as f64,
                min: 0.0,
                max: THRUST_MAX as f64,
            });
        }
        if self.rp_limit <= 0.0 {
            return Err(ConfigValidationError::NotPositive {
                field: "rp_limit",
                value: self.rp_limit as f64,
            });
        }
        Ok(())
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level stabilizer configuration, loaded from TOML at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    #[serde(default)]
    pub rates: RateLoopConfig,
    #[serde(default)]
    pub failsafe: FailsafeConfig,
    #[serde(default)]
    pub attitude: AttitudeGains,
    #[serde(default)]
    pub position: PositionGains,
    /// Divide commanded thrust by the tilt cosine to hold altitude when
    /// the body is not level.
    #[serde(default = "default_tilt_comp")]
    pub tilt_comp: bool,
}

fn default_tilt_comp() -> bool {
    true
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            rates: RateLoopConfig::default(),
            failsafe: FailsafeConfig::default(),
            attitude: AttitudeGains::default(),
            position: PositionGains::default(),
            tilt_comp: default_tilt_comp(),
        }
    }
}

impl StabilizerConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.rates.validate()?;
        self.failsafe.validate()?;
        self.position.validate()?;
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
