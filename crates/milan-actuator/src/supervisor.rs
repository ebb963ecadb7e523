//! Watchdog and alarm seams.

/// The task's watchdog slot. `register` is called once before the loop
/// starts; `feed` on every iteration, including while parked in the
/// interlock hold.
pub trait Watchdog {
    fn register(&mut self);
    fn feed(&mut self);
}

/// Alarm sink for the actuator subsystem. Raised Critical whenever outputs
/// fall back to failsafe, cleared on every successful commit.
pub trait AlarmSink {
    fn raise_critical(&mut self);
    fn clear(&mut self);
}
