//! Failsafe descent state machine: Idle → Active → Terminated.
//!
//! Engagement latches on the first estimator-declared failsafe observed
//! during an absolute-z position stage; the machine then owns the controller
//! until thrust reaches zero. Active behavior is a fixed gentle tilt at a
//! constant landing thrust — the thrust-decay value is computed as a probe
//! and compared, never applied, so the descent holds `landing_thrust` for
//! its full duration. Termination disables the x/y/z modes and is not
//! re-armable until an emergency-stop reset.

use tracing::{info, warn};

use strix_common::config::FailsafeConfig;

/// Phase of the descent sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescentPhase {
    /// No failsafe observed since the last reset.
    Idle,
    /// Controlled descent in progress.
    Active,
    /// Descent finished — thrust zeroed, position modes disabled.
    Terminated,
}

/// What the position stage must do this tick while the machine is engaged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescentCommand {
    /// Machine is idle; run the nominal position controller.
    None,
    /// Hold the fixed descent references.
    Descend {
        thrust: f32,
        roll: f32,
        pitch: f32,
    },
    /// Zero thrust and disable the x/y/z modes.
    Terminate,
}

/// Latching descent executor, ticked at position rate.
#[derive(Debug, Clone)]
pub struct FailsafeMachine {
    config: FailsafeConfig,
    /// Descent duration limit [position-rate ticks].
    landing_tick_limit: u32,
    phase: DescentPhase,
    landing_ticks: u32,
}

impl FailsafeMachine {
    pub fn new(config: FailsafeConfig, position_hz: u32) -> Self {
        Self {
            config,
            landing_tick_limit: (config.landing_time_s * position_hz as f32) as u32,
            phase: DescentPhase::Idle,
            landing_ticks: 0,
        }
    }

    /// Current phase.
    #[inline]
    pub const fn phase(&self) -> DescentPhase {
        self.phase
    }

    /// True once engaged, until an external reset (latch semantics).
    #[inline]
    pub const fn is_engaged(&self) -> bool {
        matches!(self.phase, DescentPhase::Active | DescentPhase::Terminated)
    }

    #[inline]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.phase, DescentPhase::Terminated)
    }

    #[inline]
    pub const fn landing_ticks(&self) -> u32 {
        self.landing_ticks
    }

    /// Latch the descent. A terminated machine stays terminated — the
    /// Idle → Active edge is not re-armable within a flight.
    pub fn engage(&mut self) {
        if self.phase == DescentPhase::Idle {
            self.phase = DescentPhase::Active;
            warn!(
                landing_thrust = self.config.landing_thrust,
                landing_ticks_max = self.landing_tick_limit,
                "failsafe descent engaged"
            );
        }
    }

    /// Clear the descent-duration counter. Called while the machine is not
    /// engaged; a terminated machine keeps its counter so re-engagement
    /// cannot extend the descent time.
    #[inline]
    pub fn reset_landing_counter(&mut self) {
        if self.phase != DescentPhase::Terminated {
            self.landing_ticks = 0;
        }
    }

    /// Tick the machine one position-rate step.
    ///
    /// `current_thrust` is the previous tick's output thrust; the decay
    /// probe `current_thrust - thrust_step` decides termination together
    /// with the duration counter.
    pub fn tick(&mut self, current_thrust: f32) -> DescentCommand {
        match self.phase {
            DescentPhase::Idle => DescentCommand::None,
            DescentPhase::Terminated => DescentCommand::Terminate,
            DescentPhase::Active => {
                let decreased = current_thrust - self.config.thrust_step;
                if decreased < 0.0 || self.landing_ticks > self.landing_tick_limit {
                    self.phase = DescentPhase::Terminated;
                    info!(
                        landing_ticks = self.landing_ticks,
                        "failsafe descent terminated, motors off"
                    );
                    DescentCommand::Terminate
                } else {
                    self.landing_ticks += 1;
                    DescentCommand::Descend {
                        thrust: self.config.landing_thrust,
                        roll: self.config.roll_base,
                        pitch: self.config.pitch_base,
                    }
                }
            }
        }
    }

    /// Full reset back to Idle. Only the emergency-stop reset path calls
    /// this; it re-arms the Idle → Active edge for a new flight.
    pub fn reset(&mut self) {
        self.phase = DescentPhase::Idle;
        self.landing_ticks = 0;
    }

    /// Replace the landing parameters (runtime-tunable surface).
    pub fn set_config(&mut self, config: FailsafeConfig, position_hz: u32) {
        self.config = config;
        self.landing_tick_limit = (config.landing_time_s * position_hz as f32) as u32;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION_HZ: u32 = 100;

    fn machine() -> FailsafeMachine {
        FailsafeMachine::new(FailsafeConfig::default(), POSITION_HZ)
    }

    #[test]
    fn idle_until_engaged() {
        let mut fsm = machine();
        assert_eq!(fsm.phase(), DescentPhase::Idle);
        assert_eq!(fsm.tick(30000.0), DescentCommand::None);
        assert!(!fsm.is_engaged());
    }

    #[test]
    fn engage_latches_and_descends() {
        let mut fsm = machine();
        fsm.engage();
        assert_eq!(fsm.phase(), DescentPhase::Active);

        let cmd = fsm.tick(30000.0);
        assert_eq!(
            cmd,
            DescentCommand::Descend {
                thrust: 36000.0,
                roll: 2.0,
                pitch: 0.0,
            }
        );
        assert_eq!(fsm.landing_ticks(), 1);
    }

    #[test]
    fn engagement_survives_failsafe_clearing() {
        // The caller only ever calls engage(); a cleared estimator flag
        // simply means no further engage() calls — the phase must hold.
        let mut fsm = machine();
        fsm.engage();
        fsm.tick(30000.0);
        assert!(fsm.is_engaged());
        fsm.tick(30000.0);
        assert!(fsm.is_engaged());
    }

    #[test]
    fn low_thrust_probe_terminates() {
        let mut fsm = machine();
        fsm.engage();
        // 100 - 200 < 0 → touchdown detected.
        assert_eq!(fsm.tick(100.0), DescentCommand::Terminate);
        assert!(fsm.is_terminated());
    }

    #[test]
    fn duration_limit_terminates() {
        let mut fsm = machine();
        fsm.engage();
        // landing_time 5 s at 100 Hz → limit 500. The counter is read before
        // increment, so ticks 1..=501 descend and tick 502 terminates.
        for i in 1..=501 {
            assert!(
                matches!(fsm.tick(36000.0), DescentCommand::Descend { .. }),
                "tick {i} should still descend"
            );
        }
        assert_eq!(fsm.tick(36000.0), DescentCommand::Terminate);
    }

    #[test]
    fn terminated_stays_terminated() {
        let mut fsm = machine();
        fsm.engage();
        fsm.tick(50.0); // immediate touchdown
        assert!(fsm.is_terminated());

        // Re-engagement attempts must not restart the descent.
        fsm.engage();
        assert!(fsm.is_terminated());
        assert_eq!(fsm.tick(36000.0), DescentCommand::Terminate);
    }

    #[test]
    fn counter_not_reset_while_terminated() {
        let mut fsm = machine();
        fsm.engage();
        for _ in 0..10 {
            fsm.tick(36000.0);
        }
        let ticks = fsm.landing_ticks();
        fsm.tick(0.0); // terminate via probe
        fsm.reset_landing_counter();
        assert_eq!(fsm.landing_ticks(), ticks, "terminated counter must hold");
    }

    #[test]
    fn counter_resets_while_idle() {
        let mut fsm = machine();
        fsm.engage();
        fsm.tick(36000.0);
        fsm.reset(); // emergency-stop reset path
        assert_eq!(fsm.phase(), DescentPhase::Idle);
        assert_eq!(fsm.landing_ticks(), 0);
    }

    #[test]
    fn reset_rearms_engagement() {
        let mut fsm = machine();
        fsm.engage();
        fsm.tick(0.0);
        assert!(fsm.is_terminated());
        fsm.reset();
        fsm.engage();
        assert_eq!(fsm.phase(), DescentPhase::Active);
    }

    #[test]
    fn runtime_config_update_applies() {
        let mut fsm = machine();
        fsm.set_config(
            FailsafeConfig {
                landing_thrust: 20000.0,
                landing_time_s: 1.0,
                ..FailsafeConfig::default()
            },
            POSITION_HZ,
        );
        fsm.engage();
        match fsm.tick(30000.0) {
            DescentCommand::Descend { thrust, .. } => assert_eq!(thrust, 20000.0),
            other => panic!("expected Descend, got {other:?}"),
        }
    }
}
