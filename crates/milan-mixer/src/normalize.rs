//! Per-tick input normalization: arming, throttle selection, hang-time and
//! the desired axis vector.

use embassy_time::{Duration, Instant};
use milan_config::{ActuatorSettings, AirframeType, Axis, AXIS_COUNT};

use crate::commands::{ActuatorDesired, ArmedState, FlightMode, FlightStatus, ManualControlCommand};
use crate::curve::{collective_curve, curve2_input, throttle_curve, AxisCurves};

/// The three gates the output stage applies to motor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmState {
    pub armed: bool,
    pub spin_while_armed: bool,
    /// True while the mixer is allowed to drive motors with attitude
    /// corrections: armed with positive throttle, or inside the low-power
    /// hang-time window.
    pub stabilize_now: bool,
}

/// Latched inputs plus the hang-time clock.
///
/// Flight status and manual control are refreshed only when their change
/// bits fire; between changes the last snapshot keeps being used, which is
/// why the latches live here rather than being re-read each tick.
#[derive(Debug)]
pub struct InputNormalizer {
    flight_status: FlightStatus,
    manual: ManualControlCommand,
    last_pos_throttle: Option<Instant>,
}

impl InputNormalizer {
    pub const fn new() -> Self {
        Self {
            flight_status: FlightStatus::new(),
            manual: ManualControlCommand::new(),
            last_pos_throttle: None,
        }
    }

    /// Fill the desired axis vector for this tick and derive the arming
    /// gates.
    ///
    /// `flight_status` and `manual` carry fresh snapshots only when the
    /// corresponding object changed since the previous tick. Accessory values
    /// are copied into the vector when manual control changes and then stay
    /// latched there.
    #[allow(clippy::too_many_arguments)]
    pub fn normalize(
        &mut self,
        now: Instant,
        desired: &ActuatorDesired,
        flight_status: Option<FlightStatus>,
        manual: Option<ManualControlCommand>,
        settings: &ActuatorSettings,
        airframe: AirframeType,
        curves: &AxisCurves,
        vect: &mut [f32; AXIS_COUNT],
    ) -> ArmState {
        if let Some(status) = flight_status {
            self.flight_status = status;
        }
        if let Some(manual) = manual {
            self.manual = manual;
            vect[Axis::Accessory0.index()] = manual.accessory[0];
            vect[Axis::Accessory1.index()] = manual.accessory[1];
            vect[Axis::Accessory2.index()] = manual.accessory[2];
        }

        let mut throttle = if airframe == AirframeType::HeliCp {
            // Helis run throttle straight from the stick; failsafe shuts the
            // governor down instead.
            if self.flight_status.flight_mode != FlightMode::Failsafe {
                self.manual.throttle
            } else {
                -1.0
            }
        } else {
            desired.thrust
        };

        let armed = self.flight_status.armed == ArmedState::Armed;
        let spin_while_armed = settings.motors_spin_while_armed;
        let mut stabilize_now = armed && throttle > 0.0;

        if stabilize_now {
            if settings.low_power_stabilization_max_time > 0.0 {
                self.last_pos_throttle = Some(now);
            }
        } else if let Some(last_pos) = self.last_pos_throttle {
            let window =
                Duration::from_micros((1e6 * settings.low_power_stabilization_max_time) as u64);
            if now.saturating_duration_since(last_pos) < window {
                // Keep stabilizing through a transient throttle drop, but
                // with no throttle of our own.
                stabilize_now = true;
                throttle = 0.0;
            } else {
                self.last_pos_throttle = None;
            }
        }

        let val1 = throttle_curve(throttle, &curves.throttle);
        let val2 = collective_curve(
            curve2_input(curves.source, airframe, desired, &self.manual),
            &curves.collective,
        );

        vect[Axis::ThrottleCurve1.index()] = val1;
        vect[Axis::ThrottleCurve2.index()] = val2;
        vect[Axis::Roll.index()] = desired.roll;
        vect[Axis::Pitch.index()] = desired.pitch;
        vect[Axis::Yaw.index()] = desired.yaw;

        ArmState {
            armed,
            spin_while_armed,
            stabilize_now,
        }
    }
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_status() -> FlightStatus {
        FlightStatus {
            armed: ArmedState::Armed,
            flight_mode: FlightMode::Stabilized,
        }
    }

    fn run(
        normalizer: &mut InputNormalizer,
        now: Instant,
        desired: &ActuatorDesired,
        flight_status: Option<FlightStatus>,
        manual: Option<ManualControlCommand>,
        settings: &ActuatorSettings,
        airframe: AirframeType,
    ) -> (ArmState, [f32; AXIS_COUNT]) {
        let mut vect = [0.0; AXIS_COUNT];
        let curves = AxisCurves::new();
        let arm = normalizer.normalize(
            now,
            desired,
            flight_status,
            manual,
            settings,
            airframe,
            &curves,
            &mut vect,
        );
        (arm, vect)
    }

    #[test]
    fn fills_the_desired_vector() {
        let mut normalizer = InputNormalizer::new();
        let desired = ActuatorDesired {
            roll: 0.1,
            pitch: -0.2,
            yaw: 0.3,
            thrust: 0.5,
        };
        let (arm, vect) = run(
            &mut normalizer,
            Instant::from_ticks(0),
            &desired,
            Some(armed_status()),
            None,
            &ActuatorSettings::new(),
            AirframeType::QuadX,
        );

        assert!(arm.armed && arm.stabilize_now);
        assert!((vect[Axis::ThrottleCurve1.index()] - 0.5).abs() < 1e-6);
        assert_eq!(vect[Axis::Roll.index()], 0.1);
        assert_eq!(vect[Axis::Pitch.index()], -0.2);
        assert_eq!(vect[Axis::Yaw.index()], 0.3);
    }

    #[test]
    fn accessories_latch_on_manual_change() {
        let mut normalizer = InputNormalizer::new();
        let desired = ActuatorDesired::default();
        let manual = ManualControlCommand {
            accessory: [0.5, -0.5, 1.0],
            ..ManualControlCommand::new()
        };

        let (_, vect) = run(
            &mut normalizer,
            Instant::from_ticks(0),
            &desired,
            None,
            Some(manual),
            &ActuatorSettings::new(),
            AirframeType::QuadX,
        );
        assert_eq!(vect[Axis::Accessory0.index()], 0.5);
        assert_eq!(vect[Axis::Accessory1.index()], -0.5);
        assert_eq!(vect[Axis::Accessory2.index()], 1.0);
    }

    #[test]
    fn disarmed_never_stabilizes() {
        let mut normalizer = InputNormalizer::new();
        let desired = ActuatorDesired {
            thrust: 0.8,
            ..Default::default()
        };
        let (arm, _) = run(
            &mut normalizer,
            Instant::from_ticks(0),
            &desired,
            Some(FlightStatus::new()),
            None,
            &ActuatorSettings::new(),
            AirframeType::QuadX,
        );
        assert!(!arm.armed && !arm.stabilize_now);
    }

    #[test]
    fn heli_uses_manual_throttle_until_failsafe() {
        let mut normalizer = InputNormalizer::new();
        let desired = ActuatorDesired {
            thrust: 0.9,
            ..Default::default()
        };
        let manual = ManualControlCommand {
            throttle: 0.5,
            ..ManualControlCommand::new()
        };

        let (arm, vect) = run(
            &mut normalizer,
            Instant::from_ticks(0),
            &desired,
            Some(armed_status()),
            Some(manual),
            &ActuatorSettings::new(),
            AirframeType::HeliCp,
        );
        assert!(arm.stabilize_now);
        assert!((vect[Axis::ThrottleCurve1.index()] - 0.5).abs() < 1e-6);

        let failsafe = FlightStatus {
            armed: ArmedState::Armed,
            flight_mode: FlightMode::Failsafe,
        };
        let (arm, vect) = run(
            &mut normalizer,
            Instant::from_ticks(0),
            &desired,
            Some(failsafe),
            None,
            &ActuatorSettings::new(),
            AirframeType::HeliCp,
        );
        assert!(!arm.stabilize_now);
        assert_eq!(vect[Axis::ThrottleCurve1.index()], 0.0);
    }

    #[test]
    fn hang_time_keeps_stabilizing_with_zero_throttle() {
        let mut normalizer = InputNormalizer::new();
        let settings = ActuatorSettings {
            low_power_stabilization_max_time: 1.0,
            ..ActuatorSettings::new()
        };
        let t0 = Instant::from_ticks(0);

        let spinning = ActuatorDesired {
            thrust: 0.5,
            ..Default::default()
        };
        let (arm, _) = run(
            &mut normalizer,
            t0,
            &spinning,
            Some(armed_status()),
            None,
            &settings,
            AirframeType::QuadX,
        );
        assert!(arm.stabilize_now);

        // Throttle drops to zero: still stabilizing inside the window, but
        // the throttle axis is forced to the curve's bottom knot.
        let idle = ActuatorDesired::default();
        let inside = t0 + Duration::from_millis(500);
        let (arm, vect) = run(
            &mut normalizer,
            inside,
            &idle,
            None,
            None,
            &settings,
            AirframeType::QuadX,
        );
        assert!(arm.stabilize_now);
        assert_eq!(vect[Axis::ThrottleCurve1.index()], 0.0);

        // Window expired: back to idle gating.
        let outside = t0 + Duration::from_millis(1500);
        let (arm, _) = run(
            &mut normalizer,
            outside,
            &idle,
            None,
            None,
            &settings,
            AirframeType::QuadX,
        );
        assert!(!arm.stabilize_now);
    }

    #[test]
    fn hang_time_disabled_when_max_time_is_zero() {
        let mut normalizer = InputNormalizer::new();
        let settings = ActuatorSettings::new();
        let spinning = ActuatorDesired {
            thrust: 0.5,
            ..Default::default()
        };
        let t0 = Instant::from_ticks(0);
        run(
            &mut normalizer,
            t0,
            &spinning,
            Some(armed_status()),
            None,
            &settings,
            AirframeType::QuadX,
        );

        let idle = ActuatorDesired::default();
        let (arm, _) = run(
            &mut normalizer,
            t0 + Duration::from_millis(1),
            &idle,
            None,
            None,
            &settings,
            AirframeType::QuadX,
        );
        assert!(!arm.stabilize_now);
    }
}
