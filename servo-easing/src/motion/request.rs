use std::fmt::{Display, Formatter};

use crate::errors::MotionError::InvalidMove;
use crate::errors::{Error, MoveFault};
use crate::utils::Range;

/// Describes a move: where from, where to, and either how long or how fast.
///
/// When both a duration and a speed are given, the duration wins. When none is given, the servo
/// default speed is used.
///
/// # Example
/// ```
/// use servo_easing::motion::MoveRequest;
///
/// // Moves from wherever the servo stands to 90° at 10°/s.
/// let request = MoveRequest::to(90.0).with_speed(10);
/// // Moves from 0° to 180° in exactly one second.
/// let request = MoveRequest::from_to(0.0, 180.0).with_duration(1000);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveRequest {
    /// The start angle in degrees (default: the servo current angle).
    #[cfg_attr(feature = "serde", serde(default))]
    pub start: Option<f32>,
    /// The target angle in degrees.
    pub target: f32,
    /// The time budget in ms.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<u64>,
    /// The speed in degrees per second.
    #[cfg_attr(feature = "serde", serde(default))]
    pub speed: Option<u16>,
}

/// A move after resolution against a servo: clamped angles and a non-zero time budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMove {
    pub start: f32,
    pub target: f32,
    pub duration: u64,
}

impl MoveRequest {
    /// A move from the current servo angle to the target.
    pub fn to(target: f32) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// A move from an explicit start angle to the target.
    pub fn from_to(start: f32, target: f32) -> Self {
        Self {
            start: Some(start),
            target,
            ..Default::default()
        }
    }

    /// Sets the time budget (in ms) of the move.
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the speed (in °/s) of the move.
    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Resolves the request against a servo state.
    ///
    /// # Parameters
    /// * `current`: the servo current angle, used when no start is given
    /// * `range`: the servo motion range: start and target are clamped into it
    /// * `default_speed`: the servo default speed, used when neither duration nor speed is given
    ///
    /// # Errors
    /// * `InvalidMove(ZeroLength)`: start and target are the same once clamped.
    /// * `InvalidMove(ZeroSpeed)`: the speed deciding the duration is 0°/s.
    /// * `InvalidMove(ZeroDuration)`: the time budget resolves to 0ms.
    pub fn resolve(
        &self,
        current: f32,
        range: Range<f32>,
        default_speed: u16,
    ) -> Result<ResolvedMove, Error> {
        let start = range.clamp(self.start.unwrap_or(current));
        let target = range.clamp(self.target);
        let delta = (target - start).abs();

        if delta == 0.0 {
            return Err(InvalidMove {
                fault: MoveFault::ZeroLength,
            }
            .into());
        }

        let duration = match (self.duration, self.speed.unwrap_or(default_speed)) {
            (Some(duration), _) => duration,
            (None, 0) => {
                return Err(InvalidMove {
                    fault: MoveFault::ZeroSpeed,
                }
                .into())
            }
            (None, speed) => (delta * 1000.0 / speed as f32).round() as u64,
        };

        match duration {
            0 => Err(InvalidMove {
                fault: MoveFault::ZeroDuration,
            }
            .into()),
            _ => Ok(ResolvedMove {
                start,
                target,
                duration,
            }),
        }
    }
}

impl Display for MoveRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.start {
            None => write!(f, "MOVE [to={}°", self.target)?,
            Some(start) => write!(f, "MOVE [from={}°, to={}°", start, self.target)?,
        }
        if let Some(duration) = self.duration {
            write!(f, ", duration={}ms", duration)?;
        }
        if let Some(speed) = self.speed {
            write!(f, ", speed={}°/s", speed)?;
        }
        write!(f, "]")
    }
}
