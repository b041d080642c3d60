//! Safety subsystems: the failsafe descent state machine and the latching
//! emergency-stop gate.

pub mod failsafe;
pub mod stop;

pub use failsafe::{DescentCommand, DescentPhase, FailsafeMachine};
pub use stop::EmergencyStop;
