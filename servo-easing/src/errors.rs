use std::fmt::{Display, Formatter};

use snafu::Snafu;

pub use crate::errors::Error::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure your code runs inside #[servo_easing::runtime]?
    RuntimeError,
    /// Motion error: {source}.
    MotionError { source: MotionError },
    /// Hardware error: {source}.
    HardwareError { source: HardwareError },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<MotionError> for Error {
    fn from(value: MotionError) -> Self {
        Self::MotionError { source: value }
    }
}

impl From<HardwareError> for Error {
    fn from(value: HardwareError) -> Self {
        Self::HardwareError { source: value }
    }
}

/// Why a move request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveFault {
    /// Start and target angles are equal.
    ZeroLength,
    /// The time budget resolves to 0ms for a non-zero angle delta.
    ZeroDuration,
    /// The speed deciding the time budget is 0°/s.
    ZeroSpeed,
}

impl Display for MoveFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveFault::ZeroLength => write!(f, "start and target angles are the same"),
            MoveFault::ZeroDuration => write!(f, "move would last 0ms"),
            MoveFault::ZeroSpeed => write!(f, "speed is 0°/s"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MotionError {
    /// Invalid move: {fault}
    InvalidMove { fault: MoveFault },
    /// Capacity exceeded: the scheduler holds {capacity} servos at most
    CapacityExceeded { capacity: usize },
    /// Not registered: {servo} is not ticked by this scheduler
    NotRegistered { servo: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HardwareError {
    /// Device not found: {device}
    DeviceNotFound { device: String },
    /// Invalid handle: {device} cannot attach channel {channel}
    InvalidHandle { device: String, channel: u8 },
}

impl Error {
    /// Returns the move fault if this error is an invalid move.
    ///
    /// A [`MoveFault::ZeroLength`] fault means the servo already stands at its target: callers
    /// usually treat it as an immediate completion.
    pub fn move_fault(&self) -> Option<MoveFault> {
        match self {
            Error::MotionError {
                source: MotionError::InvalidMove { fault },
            } => Some(*fault),
            _ => None,
        }
    }
}
