//! Post-mix output shaping: clipping policy, motor gating, response curve and
//! pulse calibration.

use milan_config::{ChannelType, CHANNEL_COUNT};

use crate::commands::CameraDesired;
use crate::normalize::ArmState;

/// Statistics collected over the motor channels of a raw mix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorStats {
    pub min: f32,
    pub max: f32,
    /// Sum of all negative motor outputs (how much low-side demand was
    /// already lost to clipping).
    pub neg_clip: f32,
    pub motors: usize,
}

impl MotorStats {
    pub const fn empty() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            neg_clip: 0.0,
            motors: 0,
        }
    }
}

/// First shaping pass over the raw mix.
///
/// Disabled channels drop to -1 (their calibrated minimum, not a 0 us
/// pulse), camera channels are overwritten from the gimbal demand when one
/// exists, and motor channels are folded into the clipping statistics.
pub fn apply_channel_types(
    vect: &mut [f32; CHANNEL_COUNT],
    types: &[ChannelType; CHANNEL_COUNT],
    camera: Option<&CameraDesired>,
) -> MotorStats {
    let mut stats = MotorStats::empty();

    for (value, channel_type) in vect.iter_mut().zip(types.iter()) {
        match channel_type {
            ChannelType::Disabled => *value = -1.0,
            ChannelType::Servo => {}
            ChannelType::Motor => {
                stats.min = stats.min.min(*value);
                stats.max = stats.max.max(*value);
                if *value < 0.0 {
                    stats.neg_clip += *value;
                }
                stats.motors += 1;
            }
            ChannelType::CameraPitch => {
                *value = camera.map_or(-1.0, |c| c.pitch);
            }
            ChannelType::CameraRoll => {
                *value = camera.map_or(-1.0, |c| c.roll);
            }
            ChannelType::CameraYaw => {
                // TODO: the yaw gimbal follows CameraDesired.roll; verify
                // against the gimbal wiring before switching this to yaw.
                *value = camera.map_or(-1.0, |c| c.roll);
            }
        }
    }

    stats
}

/// Derive the rescale that fits the motor band into `[0, 1]`.
///
/// Spanning more than a full unit compresses everything; a high-side
/// overshoot then sacrifices throttle to keep attitude authority, while a
/// low-side undershoot may add up to `max_power_add` of synthesized throttle
/// beyond what clipping already granted.
pub fn fit_gain_offset(stats: &MotorStats, max_power_add: f32) -> (f32, f32) {
    let mut gain = 1.0;
    let mut offset = 0.0;

    let mut min = stats.min;
    let mut max = stats.max;

    if max - min > 1.0 {
        gain = 1.0 / (max - min);
        min *= gain;
        max *= gain;
    }

    if max > 1.0 {
        offset = 1.0 - max;
    } else if min < 0.0 && stats.motors > 0 {
        let neg_clip_avg = stats.neg_clip / stats.motors as f32;
        offset = (neg_clip_avg + max_power_add).min(-min);
    }

    (gain, offset)
}

/// Gate a motor output through the arming state, then apply the rescale and
/// the propeller response curve. The curve only shapes positive commands;
/// anything at or below zero stays at zero throttle.
pub fn shape_motor(value: f32, arm: &ArmState, gain: f32, offset: f32, curve_fit: f32) -> f32 {
    if !arm.armed {
        return -1.0;
    }
    if !arm.stabilize_now {
        return if arm.spin_while_armed { 0.0 } else { -1.0 };
    }

    let value = value * gain + offset;
    if value > 0.0 {
        libm::powf(value, curve_fit)
    } else {
        0.0
    }
}

/// Convert a normalized `[-1, 1]` value to a pulse width in microseconds.
///
/// Positive values span neutral..max, negative values neutral..min, and the
/// result is clamped to the calibrated range even when travel is inverted
/// (`min > max`).
pub fn scale_channel(value: f32, min: u16, neutral: u16, max: u16) -> f32 {
    let min = min as f32;
    let neutral = neutral as f32;
    let max = max as f32;

    let scaled = if value >= 0.0 {
        value * (max - neutral) + neutral
    } else {
        value * (neutral - min) + neutral
    };

    if max > min {
        scaled.clamp(min, max)
    } else {
        scaled.clamp(max, min)
    }
}

/// Safe default for a channel when inputs are stale or the core is told to
/// stop. These are raw values: motors park at their calibrated minimum,
/// servos at neutral, cameras centered, disabled channels at -1.
pub fn failsafe_value(channel_type: ChannelType, min: u16, neutral: u16) -> f32 {
    match channel_type {
        ChannelType::Motor => min as f32,
        ChannelType::Servo => neutral as f32,
        ChannelType::Disabled => -1.0,
        ChannelType::CameraPitch | ChannelType::CameraRoll | ChannelType::CameraYaw => 0.0,
    }
}
