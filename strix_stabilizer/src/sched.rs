//! Rate scheduler: the divisor chain behind the main/attitude/position
//! hierarchy.
//!
//! A sub-rate stage fires on the ticks whose index is divisible by
//! `main_hz / sub_rate_hz`. The tick counter starts at 1, so no sub-rate
//! stage fires on the very first iteration — the estimator has not produced
//! a state yet.

use strix_common::config::RateLoopConfig;
use strix_common::error::ConfigValidationError;

/// Validated main/attitude/position rate triple.
///
/// Construction runs [`RateLoopConfig::validate`], so a value of this type
/// always carries an integer divisor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDividers {
    main_hz: u32,
    attitude_div: u32,
    position_div: u32,
}

impl RateDividers {
    /// Build the divider set from a rate configuration.
    pub fn new(rates: &RateLoopConfig) -> Result<Self, ConfigValidationError> {
        rates.validate()?;
        Ok(Self {
            main_hz: rates.main_hz,
            attitude_div: rates.main_hz / rates.attitude_hz,
            position_div: rates.main_hz / rates.position_hz,
        })
    }

    /// True iff a stage running at `sub_rate_hz` is due on this tick.
    #[inline]
    pub const fn should_run(&self, sub_rate_hz: u32, tick: u32) -> bool {
        tick % (self.main_hz / sub_rate_hz) == 0
    }

    /// True iff the attitude stage is due on this tick.
    #[inline]
    pub const fn attitude_due(&self, tick: u32) -> bool {
        tick % self.attitude_div == 0
    }

    /// True iff the position stage is due on this tick.
    #[inline]
    pub const fn position_due(&self, tick: u32) -> bool {
        tick % self.position_div == 0
    }

    #[inline]
    pub const fn main_hz(&self) -> u32 {
        self.main_hz
    }

    #[inline]
    pub const fn attitude_hz(&self) -> u32 {
        self.main_hz / self.attitude_div
    }

    #[inline]
    pub const fn position_hz(&self) -> u32 {
        self.main_hz / self.position_div
    }

    /// Attitude-stage period [s].
    #[inline]
    pub fn attitude_dt(&self) -> f32 {
        1.0 / self.attitude_hz() as f32
    }

    /// Main-loop period [ns].
    #[inline]
    pub const fn main_period_ns(&self) -> i64 {
        1_000_000_000 / self.main_hz as i64
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
