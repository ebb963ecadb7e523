//! Runtime objects exchanged with the rest of the flight stack.
//!
//! These mirror the shared-object layout the broker transports; the core only
//! ever sees snapshots of them.

use milan_config::{CHANNEL_COUNT, MANUAL_ACCESSORY_COUNT};

/// Abstract demand from the stabilization loop: torques in `[-1, 1]`, thrust
/// in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorDesired {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub thrust: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmedState {
    #[default]
    Disarmed,
    Arming,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightMode {
    #[default]
    Manual,
    Stabilized,
    Acro,
    Autonomous,
    Failsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightStatus {
    pub armed: ArmedState,
    pub flight_mode: FlightMode,
}

impl FlightStatus {
    pub const fn new() -> Self {
        Self {
            armed: ArmedState::Disarmed,
            flight_mode: FlightMode::Manual,
        }
    }
}

/// Pilot stick state. Only the throttle, collective and accessory channels
/// reach the mixer; attitude sticks go through the stabilization loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManualControlCommand {
    pub throttle: f32,
    pub collective: f32,
    pub accessory: [f32; MANUAL_ACCESSORY_COUNT],
}

impl ManualControlCommand {
    /// Throttle starts below zero so a collective-pitch heli stays shut down
    /// until the first real stick value arrives.
    pub const fn new() -> Self {
        Self {
            throttle: -1.0,
            collective: 0.0,
            accessory: [0.0; MANUAL_ACCESSORY_COUNT],
        }
    }
}

impl Default for ManualControlCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Gimbal demand, normalized to `[-1, 1]` per axis. Optional: airframes
/// without a gimbal never publish it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraDesired {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Committed output: one pulse width per channel in microseconds, plus the
/// actuation-jitter telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommand {
    pub channel: [f32; CHANNEL_COUNT],
    /// Time between the last two commits, in milliseconds.
    pub update_time: f32,
    /// Largest `update_time` observed since the field was last reset.
    pub max_update_time: f32,
}

impl ActuatorCommand {
    pub const fn new() -> Self {
        Self {
            channel: [0.0; CHANNEL_COUNT],
            update_time: 0.0,
            max_update_time: 0.0,
        }
    }
}

impl Default for ActuatorCommand {
    fn default() -> Self {
        Self::new()
    }
}
