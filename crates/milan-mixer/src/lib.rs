#![no_std]

pub mod commands;
pub mod curve;
pub mod matrix;
pub mod normalize;
pub mod output;

// Re-export commonly used types
pub use commands::{
    ActuatorCommand, ActuatorDesired, ArmedState, CameraDesired, FlightMode, FlightStatus,
    ManualControlCommand,
};
pub use curve::AxisCurves;
pub use matrix::MixerMatrix;
pub use normalize::{ArmState, InputNormalizer};
