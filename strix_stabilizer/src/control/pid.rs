//! Single-axis PID with clamped integral accumulator.
//!
//! Zero Ki disables integral; zero Kd disables derivative. The accumulator
//! is clamped to ±`integral_limit` so a persistent error cannot wind the
//! axis up past its authority.

use strix_common::config::PidGains;

/// One PID axis. Gains are fixed at construction; the mutable state is the
/// integral accumulator and previous error.
#[derive(Debug, Clone, Copy)]
pub struct AxisPid {
    gains: PidGains,
    dt: f32,
    integral: f32,
    prev_error: f32,
}

impl AxisPid {
    /// Create a new axis with the given gains and update period [s].
    pub fn new(gains: PidGains, dt: f32) -> Self {
        Self {
            gains,
            dt,
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    /// Compute one update from the current error.
    pub fn update(&mut self, error: f32) -> f32 {
        if self.dt <= 0.0 {
            return 0.0;
        }

        let p_term = self.gains.kp * error;

        let i_term = if self.gains.ki != 0.0 {
            self.integral = (self.integral + error * self.dt)
                .clamp(-self.gains.integral_limit, self.gains.integral_limit);
            self.gains.ki * self.integral
        } else {
            self.integral = 0.0;
            0.0
        };

        let d_term = if self.gains.kd != 0.0 {
            self.gains.kd * (error - self.prev_error) / self.dt
        } else {
            0.0
        };

        self.prev_error = error;
        p_term + i_term + d_term
    }

    /// Clear the accumulator and derivative history.
    #[inline]
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// Current integral accumulator (telemetry / test observability).
    #[inline]
    pub const fn integral(&self) -> f32 {
        self.integral
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
