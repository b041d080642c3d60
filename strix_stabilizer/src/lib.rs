//! # Strix Stabilizer
//!
//! Hard-realtime stabilization core for a quadrotor. Provides a deterministic
//! main-loop cycle that gathers the latest setpoint and estimated state from
//! collaborator tasks, runs a cascaded position → attitude → rate controller
//! at a strict rate hierarchy, and produces per-axis actuator commands with a
//! safe-landing failsafe and a latching emergency stop.
//!
//! ## Pipeline Stages (per tick)
//!
//! 1. Input gathering (sensors, estimator, external position, commander)
//! 2. Setpoint adjustment hooks (situation awareness, test oscillator)
//! 3. Cascaded controller (position slow, attitude medium, rate fast)
//! 4. Safety gate (emergency stop, tilt compensation)
//! 5. Actuation (power distribution or motor stop)
//!
//! ## Zero-Allocation RT Loop
//!
//! All runtime state is owned by [`cycle::StabilizerTask`], constructed once
//! at startup. The tick path performs zero heap allocations and has exactly
//! one suspension point, at the delay-until boundary.

pub mod config;
pub mod control;
pub mod cycle;
pub mod interfaces;
pub mod resolver;
pub mod safety;
pub mod sched;
pub mod sim;
pub mod stabilizer;
pub mod telemetry;
