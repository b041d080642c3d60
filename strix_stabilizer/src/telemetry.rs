//! Parameter and telemetry surface.
//!
//! Both surfaces are flat namespaces of named scalars, decoupled from the
//! control core. Parameters are written by an external task and observed by
//! the core on its next tick; telemetry is a `#[repr(C)]` snapshot the core
//! republishes every tick. Fixed-capacity storage keeps the tick path free
//! of allocation.

use heapless::Vec;
use static_assertions::const_assert_eq;

use strix_common::consts::OSCILLATOR_FREQUENCY_DEFAULT;
use strix_common::types::{AngularRate, Attitude, Vector3};

// ─── Parameter Registry ─────────────────────────────────────────────

/// A runtime-tunable scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    F32(f32),
    U32(u32),
}

/// One named parameter binding.
#[derive(Debug, Clone, Copy)]
struct ParamEntry {
    name: &'static str,
    value: ParamValue,
}

/// Registry capacity. Raising it is a recompile, not a runtime growth.
const PARAM_CAPACITY: usize = 16;

/// Registry error: capacity exhausted or duplicate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    Full,
    Duplicate,
}

/// Flat namespace of named scalar parameters.
#[derive(Debug, Default)]
pub struct ParamRegistry {
    entries: Vec<ParamEntry, PARAM_CAPACITY>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock stabilizer parameter set with its defaults.
    pub fn with_stabilizer_defaults() -> Self {
        let mut registry = Self::new();
        let defaults: [(&'static str, ParamValue); 6] = [
            ("controller.tiltComp", ParamValue::Bool(true)),
            ("controller.landingThrust", ParamValue::F32(36000.0)),
            ("controller.landingTime", ParamValue::F32(5.0)),
            ("controller.actFail", ParamValue::Bool(false)),
            ("setpoint.enable", ParamValue::Bool(false)),
            (
                "setpoint.frequency",
                ParamValue::U32(OSCILLATOR_FREQUENCY_DEFAULT),
            ),
        ];
        for (name, value) in defaults {
            // Capacity is static and the set above fits it.
            let _ = registry.register(name, value);
        }
        registry
    }

    /// Register a parameter once.
    pub fn register(&mut self, name: &'static str, value: ParamValue) -> Result<(), ParamError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(ParamError::Duplicate);
        }
        self.entries
            .push(ParamEntry { name, value })
            .map_err(|_| ParamError::Full)
    }

    /// Write a parameter. Returns false for an unknown name; the value
    /// variant must match the registered one.
    pub fn set(&mut self, name: &str, value: ParamValue) -> bool {
        for entry in self.entries.iter_mut() {
            if entry.name == name {
                if core::mem::discriminant(&entry.value) == core::mem::discriminant(&value) {
                    entry.value = value;
                    return true;
                }
                return false;
            }
        }
        false
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            ParamValue::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Iterate (name, value) pairs, registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.entries.iter().map(|e| (e.name, e.value))
    }
}

// ─── Telemetry Snapshot ─────────────────────────────────────────────

/// Per-tick scalar snapshot published by the core, read-only from outside.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct TelemetrySnapshot {
    pub actuator_thrust: f32,
    pub attitude_desired: Attitude,
    pub rate_desired: AngularRate,
    pub control_thrust: f32,
    pub state_position: Vector3,
    pub state_velocity: Vector3,
    pub state_attitude: Attitude,
    pub setpoint_position: Vector3,
    pub setpoint_attitude: Attitude,
    pub setpoint_attitude_rate: AngularRate,
    pub acc: Vector3,
    pub gyro: Vector3,
    pub mag: Vector3,
    pub baro_asl: f32,
    pub baro_temperature: f32,
    pub baro_pressure: f32,
    pub control_roll: i16,
    pub control_pitch: i16,
    pub control_yaw: i16,
    pub setpoint_thrust: u16,
    pub motor_cmds: [u16; 4],
    /// Per-axis modes (x, y, z, roll, pitch, yaw) as raw `AxisMode` values.
    pub setpoint_mode: [u8; 6],
    pub activate_failsafe: u8,
    pub fault_flags: u8,
}

const_assert_eq!(core::mem::size_of::<TelemetrySnapshot>(), 176);

// ─── Tests ──────────────────────────────────────────────────────────
