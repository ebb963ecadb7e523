//! Piecewise-linear axis curves.

use milan_config::{
    AirframeType, Curve2Source, MixerSettings, COLLECTIVE_CURVE_POINTS, MANUAL_ACCESSORY_COUNT,
    THROTTLE_CURVE_POINTS,
};

use crate::commands::{ActuatorDesired, ManualControlCommand};

/// Interpolate over `curve` with knots spaced uniformly across
/// `[input_min, input_max]`. Inputs outside the domain clamp to the end
/// knots.
pub fn linear_interpolate(input: f32, curve: &[f32], input_min: f32, input_max: f32) -> f32 {
    let num_points = curve.len();
    if num_points < 2 {
        return curve.first().copied().unwrap_or(0.0);
    }

    let mut scale = (input - input_min) / (input_max - input_min) * (num_points - 1) as f32;
    if scale < 0.0 {
        scale = 0.0;
    }

    let mut idx = scale as usize;
    scale -= idx as f32;
    if idx > num_points - 2 {
        idx = num_points - 2;
        scale = 1.0;
    }

    curve[idx] * (1.0 - scale) + curve[idx + 1] * scale
}

/// Throttle curve: input and output in `[0, 1]`. The curve's first knot
/// doubles as the shutoff value, so neutral sits right next to minimum.
#[inline]
pub fn throttle_curve(input: f32, curve: &[f32; THROTTLE_CURVE_POINTS]) -> f32 {
    linear_interpolate(input, curve, 0.0, 1.0)
}

/// Collective/auxiliary curve: input in `[-1, 1]` so the neutral point can sit
/// anywhere in the channel range.
#[inline]
pub fn collective_curve(input: f32, curve: &[f32; COLLECTIVE_CURVE_POINTS]) -> f32 {
    linear_interpolate(input, curve, -1.0, 1.0)
}

/// Both axis curves plus the curve-2 input selector, as compiled from
/// `MixerSettings`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCurves {
    pub throttle: [f32; THROTTLE_CURVE_POINTS],
    pub collective: [f32; COLLECTIVE_CURVE_POINTS],
    pub source: Curve2Source,
}

impl AxisCurves {
    pub const fn new() -> Self {
        Self {
            throttle: [0.0, 0.25, 0.5, 0.75, 1.0],
            collective: [0.0, 0.25, 0.5, 0.75, 1.0],
            source: Curve2Source::Throttle,
        }
    }

    pub fn from_settings(settings: &MixerSettings) -> Self {
        Self {
            throttle: settings.throttle_curve1,
            collective: settings.throttle_curve2,
            source: settings.curve2_source,
        }
    }
}

impl Default for AxisCurves {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the raw input for curve 2.
///
/// On a collective-pitch heli the throttle and collective sources swap
/// roles: `Throttle` reads the raw manual throttle (the governor input) and
/// `Collective` reads the stabilized thrust demand. Everywhere else
/// `Throttle` is the thrust demand and `Collective` the manual collective
/// stick.
pub fn curve2_input(
    source: Curve2Source,
    airframe: AirframeType,
    desired: &ActuatorDesired,
    manual: &ManualControlCommand,
) -> f32 {
    match source {
        Curve2Source::Throttle => {
            if airframe == AirframeType::HeliCp {
                manual.throttle
            } else {
                desired.thrust
            }
        }
        Curve2Source::Roll => desired.roll,
        Curve2Source::Pitch => desired.pitch,
        Curve2Source::Yaw => desired.yaw,
        Curve2Source::Collective => {
            if airframe == AirframeType::HeliCp {
                desired.thrust
            } else {
                manual.collective
            }
        }
        Curve2Source::Accessory0 | Curve2Source::Accessory1 | Curve2Source::Accessory2 => {
            let idx = match source {
                Curve2Source::Accessory0 => 0,
                Curve2Source::Accessory1 => 1,
                _ => 2,
            };
            if idx < MANUAL_ACCESSORY_COUNT {
                manual.accessory[idx]
            } else {
                0.0
            }
        }
    }
}
