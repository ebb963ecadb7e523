#![no_std]

//! The actuator output task.
//!
//! Converts the abstract demand published on the [`ActuatorBus`] into
//! per-channel pulse widths at the cadence of the stabilization loop,
//! honoring arming state, the clipping policy, failsafe timing and the
//! operator interlock. The PWM hardware, the watchdog and the alarm
//! subsystem stay behind traits so the same task runs on any board (and on
//! the host, where the tests drive it).

// Declared first so the logging macros are visible to the other modules.
mod fmt;

pub mod objects;
pub mod pwm;
pub mod supervisor;
pub mod task;

pub use objects::{ActuatorBus, Interlock, ObjectCell};
pub use pwm::ServoDriver;
pub use supervisor::{AlarmSink, Watchdog};
pub use task::ActuatorTask;

#[cfg(feature = "mixer-status")]
pub use objects::MixerStatus;
