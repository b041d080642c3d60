//! Deterministic stabilization cycle: input gather → setpoint adjust →
//! cascaded controller → safety gate → actuation.
//!
//! All runtime state is pre-allocated at construction; the loop body heap-
//! allocates nothing. With the `rt` feature, [`rt_setup`] locks memory,
//! prefaults the stack and moves the thread onto a pinned SCHED_FIFO slot,
//! and pacing uses `clock_nanosleep(TIMER_ABSTIME)` on `CLOCK_MONOTONIC`;
//! dev hosts pace with an absolute-deadline `std::thread::sleep` instead.
//! Either way there is exactly one suspension point per iteration and
//! overruns are counted, never fatal — the task does not exit.

use std::time::Duration;

use tracing::{debug, info};

use strix_common::config::{FailsafeConfig, StabilizerConfig};
use strix_common::error::ConfigValidationError;
use strix_common::types::{Control, MotorCmds, SensorData, Setpoint, VehicleState};

use crate::interfaces::{
    Commander, Estimator, ExternalPositionSource, PowerDistributor, SensorSource,
    SituationAwareness,
};
use crate::resolver::SetpointOscillator;
use crate::safety::EmergencyStop;
use crate::stabilizer::StabilizerCore;
use crate::telemetry::{ParamRegistry, TelemetrySnapshot};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics. Updated every cycle, no allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of cycles that exceeded the period budget.
    pub overruns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup. The cycle body itself is infallible.
#[derive(Debug)]
pub enum CycleError {
    /// RT system call failed.
    RtSetup(String),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "RT setup error: {msg}"),
        }
    }
}

impl std::error::Error for CycleError {}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Touch the working stack one page at a time so the loop never takes a
/// page fault once the pages are locked.
fn prefault_stack() {
    const PAGE: usize = 4096;
    let mut stack = [0u8; 64 * 1024];
    let mut offset = 0;
    while offset < stack.len() {
        unsafe { core::ptr::write_volatile(&mut stack[offset], 1) };
        offset += PAGE;
    }
    core::hint::black_box(&stack);
}

/// Prepare the calling thread for deterministic scheduling: lock current
/// and future memory pages, prefault the stack, pin to `cpu_core`, and
/// switch to SCHED_FIFO at `rt_priority`. Must run before the cycle loop.
#[cfg(feature = "rt")]
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::unistd::Pid;

    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall: {e}")))?;

    prefault_stack();

    let mut cpus = CpuSet::new();
    cpus.set(cpu_core)
        .and_then(|()| sched_setaffinity(Pid::from_raw(0), &cpus))
        .map_err(|e| CycleError::RtSetup(format!("pin to cpu {cpu_core}: {e}")))?;

    let param = libc::sched_param {
        sched_priority: rt_priority,
    };
    if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
        return Err(CycleError::RtSetup(format!(
            "SCHED_FIFO priority {rt_priority}: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

/// Dev-host variant: only the stack prefault applies, so both builds run
/// the same entry path.
#[cfg(not(feature = "rt"))]
pub fn rt_setup(_cpu_core: usize, _rt_priority: i32) -> Result<(), CycleError> {
    prefault_stack();
    Ok(())
}

// ─── Collaborator Bundle ────────────────────────────────────────────

/// The external tasks the core reads from and writes to, by value.
pub struct Collaborators<S, E, X, C, W, P> {
    pub sensors: S,
    pub estimator: E,
    pub external_position: X,
    pub commander: C,
    pub situation_awareness: W,
    pub power: P,
}

// ─── Stabilizer Task ────────────────────────────────────────────────

/// The periodic stabilization task: owns the core, the safety gates, the
/// parameter/telemetry surfaces and all per-tick records.
pub struct StabilizerTask<S, E, X, C, W, P> {
    core: StabilizerCore,
    oscillator: SetpointOscillator,
    emergency: EmergencyStop,
    params: ParamRegistry,
    collaborators: Collaborators<S, E, X, C, W, P>,
    failsafe_cfg: FailsafeConfig,

    setpoint: Setpoint,
    sensors: SensorData,
    state: VehicleState,
    control: Control,
    motors: MotorCmds,
    snapshot: TelemetrySnapshot,

    stats: CycleStats,
    tick: u32,
}

impl<S, E, X, C, W, P> StabilizerTask<S, E, X, C, W, P>
where
    S: SensorSource,
    E: Estimator,
    X: ExternalPositionSource,
    C: Commander,
    W: SituationAwareness,
    P: PowerDistributor,
{
    /// Build the task. The tick counter starts at 1 so no sub-rate stage
    /// fires before the estimator has produced a state.
    pub fn new(
        config: &StabilizerConfig,
        collaborators: Collaborators<S, E, X, C, W, P>,
    ) -> Result<Self, ConfigValidationError> {
        let core = StabilizerCore::new(config)?;
        let mut oscillator = SetpointOscillator::new(0);
        let params = ParamRegistry::with_stabilizer_defaults();
        if let Some(freq) = params.get_u32("setpoint.frequency") {
            oscillator.set_frequency(freq);
        }

        Ok(Self {
            core,
            oscillator,
            emergency: EmergencyStop::new(),
            params,
            collaborators,
            failsafe_cfg: config.failsafe,
            setpoint: Setpoint::default(),
            sensors: SensorData::default(),
            state: VehicleState::default(),
            control: Control::default(),
            motors: MotorCmds::default(),
            snapshot: TelemetrySnapshot::default(),
            stats: CycleStats::new(),
            tick: 1,
        })
    }

    /// Power-on self test: AND of the collaborator self tests.
    pub fn self_test(&mut self) -> bool {
        let mut pass = true;
        pass &= self.collaborators.sensors.self_test();
        pass &= self.collaborators.estimator.self_test();
        pass &= self.collaborators.power.self_test();
        pass
    }

    /// Execute exactly one cycle body. No suspension.
    pub fn run_tick(&mut self) {
        let tick = self.tick;

        // ═══ Input gathering ═══
        self.collaborators.external_position.overlay(&mut self.state);
        self.collaborators.sensors.acquire(&mut self.sensors, tick);
        self.collaborators.estimator.estimate(
            &mut self.state,
            &self.sensors,
            &self.control,
            &self.motors,
            tick,
        );
        self.collaborators
            .commander
            .get_setpoint(&mut self.setpoint, &self.state);

        // ═══ Setpoint adjustment hooks ═══
        self.collaborators.situation_awareness.update_setpoint(
            &mut self.setpoint,
            &self.sensors,
            &self.state,
        );
        self.apply_params();
        self.oscillator.apply(&mut self.setpoint, tick);

        // ═══ Cascaded controller ═══
        self.core
            .run(&mut self.control, &mut self.setpoint, &self.state, tick);

        // ═══ Safety gate + actuation ═══
        self.emergency.tick();
        let stopped = self.emergency.is_stopped();
        self.core.set_emergency_fault(stopped);
        if stopped {
            self.core.on_emergency_stop(&mut self.control, &self.state);
            self.collaborators.power.stop(&mut self.motors);
        } else {
            self.collaborators
                .power
                .distribute(&self.control, &mut self.motors);
        }

        self.publish_snapshot();
        self.tick = self.tick.wrapping_add(1);
    }

    /// Observe the parameter registry; writes land on this tick.
    fn apply_params(&mut self) {
        if let Some(tilt) = self.params.get_bool("controller.tiltComp") {
            self.core.set_tilt_comp(tilt);
        }

        let landing_thrust = self.params.get_f32("controller.landingThrust");
        let landing_time_s = self.params.get_f32("controller.landingTime");
        if let (Some(landing_thrust), Some(landing_time_s)) = (landing_thrust, landing_time_s) {
            if landing_thrust != self.failsafe_cfg.landing_thrust
                || landing_time_s != self.failsafe_cfg.landing_time_s
            {
                self.failsafe_cfg.landing_thrust = landing_thrust;
                self.failsafe_cfg.landing_time_s = landing_time_s;
                let position_hz = self.core.rates().position_hz();
                self.core
                    .failsafe_mut()
                    .set_config(self.failsafe_cfg, position_hz);
            }
        }

        if self.params.get_bool("controller.actFail") == Some(true) {
            self.core.failsafe_mut().engage();
        }

        if let Some(enable) = self.params.get_bool("setpoint.enable") {
            self.oscillator.set_enabled(enable);
        }
        if let Some(frequency) = self.params.get_u32("setpoint.frequency") {
            self.oscillator.set_frequency(frequency);
        }
    }

    fn publish_snapshot(&mut self) {
        let desired = self.core.attitude_desired();
        let rate_desired = self.core.rate_desired();
        self.snapshot = TelemetrySnapshot {
            actuator_thrust: self.core.actuator_thrust(),
            attitude_desired: desired,
            rate_desired,
            control_thrust: self.control.thrust,
            state_position: self.state.position,
            state_velocity: self.state.velocity,
            state_attitude: self.state.attitude,
            setpoint_position: self.setpoint.position,
            setpoint_attitude: self.setpoint.attitude,
            setpoint_attitude_rate: self.setpoint.attitude_rate,
            acc: self.sensors.acc,
            gyro: self.sensors.gyro,
            mag: self.sensors.mag,
            baro_asl: self.sensors.baro.asl,
            baro_temperature: self.sensors.baro.temperature,
            baro_pressure: self.sensors.baro.pressure,
            control_roll: self.control.roll,
            control_pitch: self.control.pitch,
            control_yaw: self.control.yaw,
            setpoint_thrust: self.setpoint.thrust,
            motor_cmds: [self.motors.m1, self.motors.m2, self.motors.m3, self.motors.m4],
            setpoint_mode: [
                self.setpoint.mode.x as u8,
                self.setpoint.mode.y as u8,
                self.setpoint.mode.z as u8,
                self.setpoint.mode.roll as u8,
                self.setpoint.mode.pitch as u8,
                self.setpoint.mode.yaw as u8,
            ],
            activate_failsafe: self.core.failsafe().is_engaged() as u8,
            fault_flags: self.core.flags().bits(),
        };
    }

    /// Spin on the delay primitive until the sensors report calibrated.
    fn wait_calibrated(&mut self) {
        let period = Duration::from_nanos(self.core.rates().main_period_ns() as u64);
        while !self.collaborators.sensors.calibrated() {
            std::thread::sleep(period);
        }
        debug!("sensors calibrated, entering stabilization loop");
    }

    /// Enter the paced loop forever. Never returns under normal operation.
    pub fn run(&mut self) -> Result<(), CycleError> {
        self.wait_calibrated();
        info!(
            main_hz = self.core.rates().main_hz(),
            attitude_hz = self.core.rates().attitude_hz(),
            position_hz = self.core.rates().position_hz(),
            "stabilization loop starting"
        );
        self.run_loop(None)
    }

    /// Enter the paced loop for a bounded number of ticks (bench/dev hosts).
    pub fn run_ticks(&mut self, max_ticks: u64) -> Result<(), CycleError> {
        self.wait_calibrated();
        self.run_loop(Some(max_ticks))
    }

    /// Run `n` cycle bodies back-to-back with no pacing (tests).
    pub fn run_unpaced(&mut self, n: u64) {
        for _ in 0..n {
            self.run_tick();
        }
    }

    /// RT cycle loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_loop(&mut self, max_ticks: Option<u64>) -> Result<(), CycleError> {
        use nix::sys::time::{TimeSpec, TimeValLike};
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.core.rates().main_period_ns();
        let period = TimeSpec::nanoseconds(period_ns);
        let now = |label: &'static str| {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("{label}: {e}")))
        };

        let mut next_wake = now("initial clock_gettime")? + period;
        let mut executed: u64 = 0;

        loop {
            let cycle_start = now("cycle clock_gettime")?;

            self.run_tick();

            let duration_ns = (now("cycle clock_gettime")? - cycle_start).num_nanoseconds();
            self.stats.record(duration_ns);
            if duration_ns > period_ns {
                self.stats.overruns += 1;
            }

            executed += 1;
            if let Some(max) = max_ticks {
                if executed >= max {
                    return Ok(());
                }
            }

            // The single suspension point of the loop.
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            next_wake = next_wake + period;
        }
    }

    /// Simulation cycle loop with absolute-deadline pacing.
    #[cfg(not(feature = "rt"))]
    fn run_loop(&mut self, max_ticks: Option<u64>) -> Result<(), CycleError> {
        use std::time::Instant;

        let period_ns = self.core.rates().main_period_ns();
        let period = Duration::from_nanos(period_ns as u64);
        let mut next_wake = Instant::now() + period;
        let mut executed: u64 = 0;

        loop {
            let cycle_start = Instant::now();

            self.run_tick();

            let duration_ns = cycle_start.elapsed().as_nanos() as i64;
            self.stats.record(duration_ns);
            if duration_ns > period_ns {
                self.stats.overruns += 1;
            }

            executed += 1;
            if let Some(max) = max_ticks {
                if executed >= max {
                    return Ok(());
                }
            }

            // The single suspension point of the loop.
            let now = Instant::now();
            if next_wake > now {
                std::thread::sleep(next_wake - now);
            }
            next_wake += period;
        }
    }

    // ── External control surface ──

    /// Engage the emergency-stop latch immediately.
    pub fn set_emergency_stop(&mut self) {
        self.emergency.set();
    }

    /// Clear the emergency-stop latch and re-arm the failsafe machine.
    pub fn reset_emergency_stop(&mut self) {
        self.emergency.reset();
        self.core.failsafe_mut().reset();
    }

    /// Arm the emergency-stop countdown [main ticks]; clears the latch and
    /// re-arms the failsafe machine.
    pub fn set_emergency_stop_timeout(&mut self, ticks: i32) {
        self.emergency.set_timeout(ticks);
        self.core.failsafe_mut().reset();
    }

    // ── Accessors ──

    #[inline]
    pub fn params_mut(&mut self) -> &mut ParamRegistry {
        &mut self.params
    }

    #[inline]
    pub const fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    #[inline]
    pub const fn control(&self) -> &Control {
        &self.control
    }

    #[inline]
    pub const fn motors(&self) -> &MotorCmds {
        &self.motors
    }

    #[inline]
    pub const fn core(&self) -> &StabilizerCore {
        &self.core
    }

    #[inline]
    pub const fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub const fn tick(&self) -> u32 {
        self.tick
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_stats_basic() {
        let mut stats = CycleStats::new();
        assert_eq!(stats.avg_cycle_ns(), 0);

        stats.record(500_000);
        assert_eq!(stats.cycle_count, 1);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 500_000);

        stats.record(700_000);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 700_000);
        assert_eq!(stats.avg_cycle_ns(), 600_000);
    }

    #[test]
    fn rt_setup_without_rt_feature_succeeds() {
        #[cfg(not(feature = "rt"))]
        {
            assert!(rt_setup(0, 80).is_ok());
        }
    }

    #[test]
    fn cycle_error_display() {
        let err = CycleError::RtSetup("mlockall failed".into());
        assert!(err.to_string().contains("mlockall"));
    }
}
