//! Mixer matrix build and multiply.

use milan_config::{Axis, ChannelType, MixerSettings, AXIS_COUNT, CHANNEL_COUNT, MIXER_SCALE};
use nalgebra::{Matrix3, Vector3};

/// The compiled mixer: one coefficient row per output channel over the axis
/// order, plus the channel type table.
///
/// Rows whose type is neither `Motor` nor `Servo` are zero-filled, so a
/// matrix-vector multiply cannot leak axis demand into camera or disabled
/// channels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerMatrix {
    rows: [[f32; AXIS_COUNT]; CHANNEL_COUNT],
    types: [ChannelType; CHANNEL_COUNT],
}

impl MixerMatrix {
    pub const fn new() -> Self {
        Self {
            rows: [[0.0; AXIS_COUNT]; CHANNEL_COUNT],
            types: [ChannelType::Disabled; CHANNEL_COUNT],
        }
    }

    /// Compile the integer coefficient table into floats, zero-filling rows
    /// that drive neither a motor nor a servo, and applying the rotor tilt
    /// rotation to motor rows when a tilt angle is configured.
    pub fn build(settings: &MixerSettings, tilt_rad: f32) -> Self {
        let mut matrix = Self::new();

        for (ch, mixer) in settings.channels.iter().enumerate() {
            matrix.types[ch] = mixer.channel_type;

            if matches!(mixer.channel_type, ChannelType::Motor | ChannelType::Servo) {
                for (axis, value) in mixer.vector.iter().enumerate() {
                    matrix.rows[ch][axis] = *value as f32 / MIXER_SCALE;
                }
            }

            if mixer.channel_type == ChannelType::Motor {
                tilt_motor_row(&mut matrix.rows[ch], tilt_rad);
            }
        }

        matrix
    }

    #[inline]
    pub fn types(&self) -> &[ChannelType; CHANNEL_COUNT] {
        &self.types
    }

    #[inline]
    pub fn channel_type(&self, ch: usize) -> ChannelType {
        self.types[ch]
    }

    #[inline]
    pub fn row(&self, ch: usize) -> &[f32; AXIS_COUNT] {
        &self.rows[ch]
    }

    /// `rows · desired`: one raw output per channel.
    pub fn mix(&self, desired: &[f32; AXIS_COUNT]) -> [f32; CHANNEL_COUNT] {
        let mut out = [0.0; CHANNEL_COUNT];
        for (value, row) in out.iter_mut().zip(self.rows.iter()) {
            for (coeff, axis) in row.iter().zip(desired.iter()) {
                *value += coeff * axis;
            }
        }
        out
    }
}

impl Default for MixerMatrix {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate a motor row's force/torque mixture about the body Y axis.
///
/// The row encodes the motor's thrust share `c1 = -row[ThrottleCurve1]`, its
/// torque `tau = (0, 0, yaw)` and, implicitly, its position relative to the
/// CG: `d = (pitch/c1, -roll/c1, 0)`. Tilting the rotor rotates the force
/// and torque vectors but not the motor position, so the rotated moments are
/// `d x Ry(theta)*F + Ry(theta)*tau`.
///
/// A zero thrust share leaves the position undefined, so such rows pass
/// through untouched; the same applies to a zero tilt angle, where the
/// rotation is the identity.
pub fn tilt_motor_row(row: &mut [f32; AXIS_COUNT], theta: f32) {
    let c1 = -row[Axis::ThrottleCurve1.index()];
    if theta == 0.0 || c1 == 0.0 {
        return;
    }

    let roll = row[Axis::Roll.index()];
    let pitch = row[Axis::Pitch.index()];
    let yaw = row[Axis::Yaw.index()];

    let force = Vector3::new(0.0, 0.0, -c1);
    let tau = Vector3::new(0.0, 0.0, yaw);
    let d = Vector3::new(pitch / c1, -roll / c1, 0.0);

    let (sin, cos) = (libm::sinf(theta), libm::cosf(theta));
    #[rustfmt::skip]
    let ry = Matrix3::new(
        cos, 0.0, sin,
        0.0, 1.0, 0.0,
        -sin, 0.0, cos,
    );

    let force_rot = ry * force;
    let tau_rot = ry * tau;
    let moment_rot = d.cross(&force_rot) + tau_rot;

    row[Axis::ThrottleCurve1.index()] = force_rot.z;
    row[Axis::Roll.index()] = moment_rot.x;
    row[Axis::Pitch.index()] = moment_rot.y;
    row[Axis::Yaw.index()] = moment_rot.z;
}
