//! Workspace-wide constants and parameter bounds.
//!
//! Bounds are consumed by the `validate()` methods in [`crate::config`].

/// Maximum commanded thrust in raw actuator units (full u16 range).
pub const THRUST_MAX: f32 = 65535.0;

/// Lower clamp for the tilt-compensation cosine. The estimator must never
/// publish a value below this; the thrust projection clamps again before
/// dividing so a violation saturates thrust instead of producing NaN.
pub const TILT_COMP_EPSILON: f32 = 0.1;

/// Main-loop frequency bounds [Hz].
pub const MAIN_HZ_MIN: u32 = 500;
pub const MAIN_HZ_MAX: u32 = 1000;

/// Default loop rates [Hz].
pub const MAIN_HZ_DEFAULT: u32 = 1000;
pub const ATTITUDE_HZ_DEFAULT: u32 = 500;
pub const POSITION_HZ_DEFAULT: u32 = 100;

/// Failsafe descent defaults.
pub const LANDING_THRUST_DEFAULT: f32 = 36000.0;
pub const LANDING_TIME_S_DEFAULT: f32 = 5.0;
pub const FAILSAFE_ROLL_BASE_DEFAULT: f32 = 2.0;
pub const FAILSAFE_PITCH_BASE_DEFAULT: f32 = 0.0;
pub const FAILSAFE_THRUST_STEP_DEFAULT: f32 = 200.0;

/// Emergency-stop countdown value meaning "no countdown armed".
pub const EMERGENCY_STOP_TIMEOUT_DISABLED: i32 = -1;

/// Test-mode setpoint oscillator default period [main-loop ticks].
pub const OSCILLATOR_FREQUENCY_DEFAULT: u32 = 3000;
