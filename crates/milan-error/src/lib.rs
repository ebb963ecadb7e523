#![no_std]

//! Flash-efficient error handling using thiserror 2.0

use thiserror::Error;

/// Errors surfaced by a servo/ESC output backend.
///
/// The task never propagates these: any backend failure degrades to failsafe
/// plus a Critical alarm, and the loop keeps ticking.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    #[error("channel index out of range")]
    InvalidChannel,

    #[error("timer bank index out of range")]
    InvalidBank,

    #[error("pulse width not representable by the timer")]
    PulseOutOfRange,

    #[error("backend rejected the update")]
    Backend,
}

/// Main error type that encompasses all subsystem errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MilanError {
    #[error("servo output error: {0}")]
    Servo(#[from] ServoError),
}

pub type MilanResult<T> = Result<T, MilanError>;
