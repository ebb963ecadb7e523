//! Shared-object slots, change bits and the operator interlock.
//!
//! The broker side of the firmware publishes into these cells from whatever
//! context it runs in; the actuator task is the only mutator of everything
//! derived from them. Cross-context signalling is limited to word-sized
//! atomics — the task tolerates one stale-read cycle, so no fences are
//! needed beyond the atomics themselves.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;

use milan_config::{
    ActuatorSettings, MixerSettings, SystemSettings, TRIGGER_QUEUE_DEPTH,
};
use milan_mixer::{
    ActuatorCommand, ActuatorDesired, CameraDesired, FlightStatus, ManualControlCommand,
};

#[cfg(feature = "mixer-status")]
use milan_config::CHANNEL_COUNT;

/// A broker-owned object slot: the last published snapshot plus a change
/// bit. The bit follows the callback contract "set my bit": publishers set
/// it, the task polls and clears it.
pub struct ObjectCell<T: Copy> {
    value: Mutex<CriticalSectionRawMutex, Cell<T>>,
    dirty: AtomicBool,
}

impl<T: Copy> ObjectCell<T> {
    /// Slots start dirty so the task fetches every object on its first run.
    pub const fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(Cell::new(initial)),
            dirty: AtomicBool::new(true),
        }
    }

    pub fn get(&self) -> T {
        self.value.lock(|cell| cell.get())
    }

    /// Broker-side write: stores the snapshot and raises the change bit.
    pub fn publish(&self, value: T) {
        self.value.lock(|cell| cell.set(value));
        self.dirty.store(true, Ordering::Release);
    }

    /// Task-side write that must not re-raise the change bit.
    pub fn store(&self, value: T) {
        self.value.lock(|cell| cell.set(value));
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Read-and-clear the change bit.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

/// Operator interlock word.
///
/// An external agent sets `StopRequest` and waits for `Stopped` before doing
/// anything intrusive to the timer hardware; the task latches `Stopped`
/// itself after driving failsafe long enough, and only the agent moves the
/// word back to `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Interlock {
    Ok = 0,
    StopRequest = 1,
    Stopped = 2,
}

pub struct InterlockCell(AtomicU8);

impl InterlockCell {
    pub const fn new() -> Self {
        Self(AtomicU8::new(Interlock::Ok as u8))
    }

    pub fn get(&self) -> Interlock {
        match self.0.load(Ordering::Acquire) {
            0 => Interlock::Ok,
            1 => Interlock::StopRequest,
            _ => Interlock::Stopped,
        }
    }

    pub fn set(&self, state: Interlock) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for InterlockCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw post-mix motor vector, published once per tick for mixer debugging.
#[cfg(feature = "mixer-status")]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerStatus {
    pub mixer_vals: [f32; CHANNEL_COUNT],
}

/// Every object the actuator task consumes or produces, in one place, so a
/// firmware can hold it in a single `static`.
pub struct ActuatorBus {
    pub desired: ObjectCell<ActuatorDesired>,
    pub flight_status: ObjectCell<FlightStatus>,
    pub manual_control: ObjectCell<ManualControlCommand>,
    /// `None` until a gimbal module publishes for the first time.
    pub camera_desired: ObjectCell<Option<CameraDesired>>,
    pub actuator_settings: ObjectCell<ActuatorSettings>,
    pub mixer_settings: ObjectCell<MixerSettings>,
    pub system_settings: ObjectCell<SystemSettings>,
    pub command: ObjectCell<ActuatorCommand>,
    pub interlock: InterlockCell,
    #[cfg(feature = "mixer-status")]
    pub mixer_status: ObjectCell<MixerStatus>,
    /// Demand trigger: carries only "something happened", the payload is
    /// pulled from `desired` on the next fetch.
    pub(crate) trigger: Channel<CriticalSectionRawMutex, (), TRIGGER_QUEUE_DEPTH>,
    command_read_only: AtomicBool,
}

impl ActuatorBus {
    pub const fn new() -> Self {
        Self {
            desired: ObjectCell::new(ActuatorDesired {
                roll: 0.0,
                pitch: 0.0,
                yaw: 0.0,
                thrust: 0.0,
            }),
            flight_status: ObjectCell::new(FlightStatus::new()),
            manual_control: ObjectCell::new(ManualControlCommand::new()),
            camera_desired: ObjectCell::new(None),
            actuator_settings: ObjectCell::new(ActuatorSettings::new()),
            mixer_settings: ObjectCell::new(MixerSettings::new()),
            system_settings: ObjectCell::new(SystemSettings::new()),
            command: ObjectCell::new(ActuatorCommand::new()),
            interlock: InterlockCell::new(),
            #[cfg(feature = "mixer-status")]
            mixer_status: ObjectCell::new(MixerStatus {
                mixer_vals: [0.0; CHANNEL_COUNT],
            }),
            trigger: Channel::new(),
            command_read_only: AtomicBool::new(false),
        }
    }

    /// Publish a new demand and wake the task. A full trigger queue is fine:
    /// the task will pick up the latest snapshot on its next fetch anyway.
    pub fn publish_desired(&self, desired: ActuatorDesired) {
        self.desired.publish(desired);
        let _ = self.trigger.try_send(());
    }

    /// The airframe type is re-read under the mixer-settings change bit, so
    /// a system-settings publish flags the mixer settings as changed.
    pub fn publish_system_settings(&self, settings: SystemSettings) {
        self.system_settings.store(settings);
        self.mixer_settings.mark_dirty();
    }

    pub fn publish_camera_desired(&self, camera: CameraDesired) {
        self.camera_desired.publish(Some(camera));
    }

    /// While a ground station calibrates servos it owns `command`; the task
    /// then mirrors the externally written values instead of publishing.
    pub fn set_command_read_only(&self, read_only: bool) {
        self.command_read_only.store(read_only, Ordering::Release);
    }

    pub fn command_read_only(&self) -> bool {
        self.command_read_only.load(Ordering::Acquire)
    }
}

impl Default for ActuatorBus {
    fn default() -> Self {
        Self::new()
    }
}
