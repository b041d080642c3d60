//! Shared error and fault types.
//!
//! Configuration validation uses `thiserror`; runtime fault conditions are
//! flags, not errors — the tick path is infallible and publishes a
//! [`FaultFlags`] byte to telemetry instead.

use bitflags::bitflags;
use thiserror::Error;

/// Configuration bound/consistency violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{outer_name} {outer_hz} Hz is not an integer multiple of {inner_name} {inner_hz} Hz")]
    NonIntegerDivisor {
        outer_name: &'static str,
        outer_hz: u32,
        inner_name: &'static str,
        inner_hz: u32,
    },
}

bitflags! {
    /// Runtime fault conditions observed by the core, published per tick.
    ///
    /// CRITICAL flags (motors stopped or stopping): EMERGENCY_STOP,
    /// FAILSAFE_TERMINATED.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u8 {
        /// Estimator declared failsafe this tick.
        const ESTIMATOR_FAILSAFE  = 0x01;
        /// Failsafe descent machine is ACTIVE.
        const FAILSAFE_DESCENT    = 0x02;
        /// Failsafe descent machine has TERMINATED. **CRITICAL**.
        const FAILSAFE_TERMINATED = 0x04;
        /// Emergency-stop latch is engaged. **CRITICAL**.
        const EMERGENCY_STOP      = 0x08;
        /// Tilt compensation hit its epsilon clamp this tick.
        const TILT_CLAMPED        = 0x10;
    }
}

impl FaultFlags {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self =
        Self::from_bits_truncate(Self::FAILSAFE_TERMINATED.bits() | Self::EMERGENCY_STOP.bits());

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for FaultFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_mask_detection() {
        let mut flags = FaultFlags::ESTIMATOR_FAILSAFE | FaultFlags::FAILSAFE_DESCENT;
        assert!(!flags.has_critical());
        flags |= FaultFlags::EMERGENCY_STOP;
        assert!(flags.has_critical());
    }

    #[test]
    fn validation_error_display() {
        let err = ConfigValidationError::NonIntegerDivisor {
            outer_name: "main_hz",
            outer_hz: 1000,
            inner_name: "attitude_hz",
            inner_hz: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("1000"));
        assert!(msg.contains("300"));
    }
}
