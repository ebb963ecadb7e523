#![no_std]

//! Static configuration for the actuator output core.
//!
//! Everything the mixer and the output task need to size their buffers lives
//! here as compile-time constants, together with the settings objects that a
//! ground station (or flash profile) publishes at runtime.

/// Number of physical output channels driven by the core.
pub const CHANNEL_COUNT: usize = 10;

/// Number of mixer axes (columns of the mixer matrix).
pub const AXIS_COUNT: usize = 8;

/// Integer mixer coefficients are stored as `value / MIXER_SCALE`.
pub const MIXER_SCALE: f32 = 128.0;

/// Knot count of the throttle curve (curve 1, domain `[0, 1]`).
pub const THROTTLE_CURVE_POINTS: usize = 5;

/// Knot count of the collective/auxiliary curve (curve 2, domain `[-1, 1]`).
pub const COLLECTIVE_CURVE_POINTS: usize = 5;

/// Number of timer banks with individually configurable update rates.
pub const TIMER_BANKS: usize = 6;

/// Upper bound on timer banks supported by the servo backends.
pub const MAX_SERVO_BANKS: usize = 6;

/// Accessory channels carried by `ManualControlCommand`.
pub const MANUAL_ACCESSORY_COUNT: usize = 3;

/// Accessory columns at the tail of the mixer axis order.
pub const MIXER_ACCESSORY_COUNT: usize = AXIS_COUNT - Axis::Accessory0 as usize;

/// How long the task waits on the demand queue before driving failsafe.
pub const FAILSAFE_TIMEOUT_MS: u64 = 100;

/// Continuous STOPREQUEST time before the task latches STOPPED.
pub const INTERLOCK_STOP_HOLD_MS: u64 = 100;

/// Poll/sleep period inside the interlock hold loop.
pub const INTERLOCK_POLL_MS: u64 = 3;

/// Depth of the demand trigger queue. Overflow is benign: the payload is
/// pulled from the shared objects, so the latest state wins.
pub const TRIGGER_QUEUE_DEPTH: usize = 2;

const _: () = assert!(TIMER_BANKS <= MAX_SERVO_BANKS);
const _: () = assert!(MIXER_ACCESSORY_COUNT >= MANUAL_ACCESSORY_COUNT);
const _: () = assert!(THROTTLE_CURVE_POINTS >= 2 && COLLECTIVE_CURVE_POINTS >= 2);

/// Mixer axis order. The desired vector and every mixer row are indexed by
/// these discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Axis {
    ThrottleCurve1 = 0,
    ThrottleCurve2 = 1,
    Roll = 2,
    Pitch = 3,
    Yaw = 4,
    Accessory0 = 5,
    Accessory1 = 6,
    Accessory2 = 7,
}

impl Axis {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// What kind of actuator a channel drives. Rows that are neither `Motor` nor
/// `Servo` are zero-filled in the mixer matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelType {
    #[default]
    Disabled,
    Motor,
    Servo,
    CameraPitch,
    CameraRoll,
    CameraYaw,
}

/// Selectable input for the second curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Curve2Source {
    #[default]
    Throttle,
    Roll,
    Pitch,
    Yaw,
    Collective,
    Accessory0,
    Accessory1,
    Accessory2,
}

/// Airframe category. Only `HeliCp` changes the core's behavior (throttle and
/// collective sources swap), the rest is carried for configuration round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AirframeType {
    FixedWing,
    FlyingWing,
    QuadP,
    #[default]
    QuadX,
    Hexa,
    Octo,
    HeliCp,
    Custom,
}

/// One mixer row: the channel's actuator type plus its integer coefficients
/// over the axis order (scaled by [`MIXER_SCALE`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerChannel {
    pub channel_type: ChannelType,
    pub vector: [i8; AXIS_COUNT],
}

impl MixerChannel {
    pub const DISABLED: Self = Self {
        channel_type: ChannelType::Disabled,
        vector: [0; AXIS_COUNT],
    };
}

impl Default for MixerChannel {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Mixer geometry and curve shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerSettings {
    pub channels: [MixerChannel; CHANNEL_COUNT],
    pub throttle_curve1: [f32; THROTTLE_CURVE_POINTS],
    pub throttle_curve2: [f32; COLLECTIVE_CURVE_POINTS],
    pub curve2_source: Curve2Source,
}

impl MixerSettings {
    pub const fn new() -> Self {
        Self {
            channels: [MixerChannel::DISABLED; CHANNEL_COUNT],
            throttle_curve1: [0.0, 0.25, 0.5, 0.75, 1.0],
            throttle_curve2: [0.0, 0.25, 0.5, 0.75, 1.0],
            curve2_source: Curve2Source::Throttle,
        }
    }
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel pulse calibration, bank rates and the motor policy knobs.
///
/// `channel_min` may exceed `channel_max`; the output stage honors inverted
/// travel when clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorSettings {
    pub channel_min: [u16; CHANNEL_COUNT],
    pub channel_neutral: [u16; CHANNEL_COUNT],
    pub channel_max: [u16; CHANNEL_COUNT],
    pub timer_update_freq: [u16; TIMER_BANKS],
    pub motors_spin_while_armed: bool,
    /// Seconds of continued stabilization after throttle drops to zero.
    pub low_power_stabilization_max_time: f32,
    /// Extra normalized throttle the mixer may synthesize to recover
    /// low-side clipping.
    pub low_power_stabilization_max_power_add: f32,
    /// Exponent of the motor input/output response curve.
    pub motor_input_output_curve_fit: f32,
}

impl ActuatorSettings {
    pub const fn new() -> Self {
        Self {
            channel_min: [1000; CHANNEL_COUNT],
            channel_neutral: [1000; CHANNEL_COUNT],
            channel_max: [2000; CHANNEL_COUNT],
            timer_update_freq: [50; TIMER_BANKS],
            motors_spin_while_armed: false,
            low_power_stabilization_max_time: 0.0,
            low_power_stabilization_max_power_add: 0.0,
            motor_input_output_curve_fit: 1.0,
        }
    }
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Vehicle-wide settings the core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemSettings {
    pub airframe_type: AirframeType,
}

impl SystemSettings {
    pub const fn new() -> Self {
        Self {
            airframe_type: AirframeType::QuadX,
        }
    }
}
