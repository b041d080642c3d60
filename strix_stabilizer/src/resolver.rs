//! Setpoint resolution: yaw reference handling, manual-mode attitude
//! overrides, and the test-mode setpoint oscillator.
//!
//! Runs at attitude rate. A velocity-mode yaw command is integrated into a
//! moving yaw angle reference; the per-tick delta is `rate * (1 /
//! attitude_hz)` — parameterized on the configured attitude rate, not a
//! fixed divisor.

use strix_common::types::{AxisMode, Setpoint, wrap_angle};

/// Yaw-reference resolver at a fixed attitude-loop period.
#[derive(Debug, Clone, Copy)]
pub struct SetpointResolver {
    attitude_dt: f32,
}

impl SetpointResolver {
    /// `attitude_dt` is the attitude-stage period [s].
    pub const fn new(attitude_dt: f32) -> Self {
        Self { attitude_dt }
    }

    /// Resolve the yaw reference for this attitude tick.
    ///
    /// Velocity mode integrates the commanded yaw rate into the current
    /// reference and wraps it into [-180, 180]; any other mode copies the
    /// absolute setpoint yaw.
    pub fn resolve_yaw(&self, current_desired_yaw: f32, setpoint: &Setpoint) -> f32 {
        if setpoint.mode.yaw == AxisMode::Velocity {
            wrap_angle(current_desired_yaw - setpoint.attitude_rate.yaw * self.attitude_dt)
        } else {
            setpoint.attitude.yaw
        }
    }
}

/// Roll/pitch reference override for manual position modes.
///
/// When x or y is Disabled the position controller's output is discarded for
/// this tick and the raw setpoint attitude is authoritative.
#[inline]
pub fn manual_roll_pitch(setpoint: &Setpoint) -> Option<(f32, f32)> {
    if setpoint.mode.x == AxisMode::Disabled || setpoint.mode.y == AxisMode::Disabled {
        Some((setpoint.attitude.roll, setpoint.attitude.pitch))
    } else {
        None
    }
}

// ─── Test-Mode Setpoint Oscillator ──────────────────────────────────

/// Diagnostic square-wave generator on the Y position setpoint.
///
/// Every `frequency` ticks the Y setpoint is negated; between toggles it is
/// held at the last toggled value. While disabled, the observed setpoint is
/// tracked as the baseline so enabling starts from the live reference. No
/// other axis is touched.
#[derive(Debug, Clone, Copy)]
pub struct SetpointOscillator {
    enabled: bool,
    frequency: u32,
    last_toggle_tick: u32,
    current: f32,
}

impl SetpointOscillator {
    pub const fn new(frequency: u32) -> Self {
        Self {
            enabled: false,
            frequency,
            last_toggle_tick: 1,
            current: 0.0,
        }
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }

    /// Apply the oscillator to this tick's setpoint.
    pub fn apply(&mut self, setpoint: &mut Setpoint, tick: u32) {
        if self.enabled {
            if tick.wrapping_sub(self.last_toggle_tick) > self.frequency {
                self.current = -self.current;
                self.last_toggle_tick = tick;
            }
            setpoint.position.y = self.current;
        } else {
            self.current = setpoint.position.y;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
