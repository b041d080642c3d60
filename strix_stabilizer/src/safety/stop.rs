//! Latching emergency-stop gate.
//!
//! A countdown armed by an external caller decrements once per main tick;
//! reaching zero latches the stop. While latched, actuation is bypassed and
//! the power layer is told to stop all motors. There is no automatic
//! recovery path — only an external reset or a new timeout clears the latch.

use tracing::warn;

use strix_common::consts::EMERGENCY_STOP_TIMEOUT_DISABLED;

#[derive(Debug, Clone, Copy)]
pub struct EmergencyStop {
    latched: bool,
    timeout_ticks: i32,
}

impl EmergencyStop {
    pub const fn new() -> Self {
        Self {
            latched: false,
            timeout_ticks: EMERGENCY_STOP_TIMEOUT_DISABLED,
        }
    }

    /// Advance the countdown one main tick.
    pub fn tick(&mut self) {
        if self.timeout_ticks >= 0 {
            self.timeout_ticks -= 1;
            if self.timeout_ticks == 0 {
                self.latched = true;
                warn!("emergency-stop countdown expired, motors stopping");
            }
        }
    }

    /// True while the latch is engaged.
    #[inline]
    pub const fn is_stopped(&self) -> bool {
        self.latched
    }

    /// Engage the latch immediately.
    #[inline]
    pub fn set(&mut self) {
        self.latched = true;
    }

    /// Clear the latch.
    #[inline]
    pub fn reset(&mut self) {
        self.latched = false;
    }

    /// Arm the countdown [main ticks]. Also clears the latch.
    pub fn set_timeout(&mut self, ticks: i32) {
        self.latched = false;
        self.timeout_ticks = ticks;
    }
}

impl Default for EmergencyStop {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
