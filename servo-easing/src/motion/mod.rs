//! Defines how moves are described, eased and scheduled.

pub use crate::motion::easing::Easing;
pub use crate::motion::request::{MoveRequest, ResolvedMove};
pub use crate::motion::scheduler::{
    MotionScheduler, SchedulerConfig, SchedulerEvent, SchedulingMode, SlotHandle,
};

mod easing;
mod request;
pub(crate) mod scheduler;
