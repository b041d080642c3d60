//! Sub-controllers of the cascade: the shared PID axis, the outer/inner
//! attitude controller, and the position/velocity controller.
//!
//! PID integrator state lives inside these owned values and persists across
//! ticks; only the orchestrator calls into them, and the `reset_*` operations
//! are the only mutation besides a normal update.

pub mod attitude;
pub mod pid;
pub mod position;

pub use attitude::AttitudeController;
pub use pid::AxisPid;
pub use position::PositionController;
