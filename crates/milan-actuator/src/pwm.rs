//! Hardware seam for the servo/ESC output stage.

use milan_config::{CHANNEL_COUNT, TIMER_BANKS};
use milan_error::ServoError;

/// The timer subsystem as the task sees it: bank configuration, per-channel
/// pulse programming, and a latch that applies a batch atomically.
///
/// Implementations wrap the board's PWM/DShot peripherals. The task treats
/// every error the same way — failsafe plus a Critical alarm — so a backend
/// should only fail for genuinely unprogrammable requests.
pub trait ServoDriver {
    /// Reconfigure the banks: one update rate per bank, plus the calibrated
    /// range of every channel (the driver uses these to pick pulse limits
    /// and idle values).
    fn set_mode(
        &mut self,
        update_freq_hz: &[u16; TIMER_BANKS],
        channel_max: &[u16; CHANNEL_COUNT],
        channel_min: &[u16; CHANNEL_COUNT],
    ) -> Result<(), ServoError>;

    /// Program one channel's pulse width in microseconds. Not applied until
    /// [`ServoDriver::update`] latches the batch.
    fn set(&mut self, channel: usize, pulse_us: f32) -> Result<(), ServoError>;

    /// Latch everything programmed since the previous call.
    fn update(&mut self) -> Result<(), ServoError>;
}
