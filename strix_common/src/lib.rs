//! Strix Common Library
//!
//! Shared value types, configuration structures and constants for the strix
//! flight-stabilization workspace. Everything the stabilization core and its
//! collaborators exchange lives here: the setpoint/state/control records, the
//! per-axis mode enumeration, rate and failsafe configuration with bound
//! validation, and the fault bitflags published to telemetry.

pub mod config;
pub mod consts;
pub mod error;
pub mod types;
