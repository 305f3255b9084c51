pub use log;
pub use tokio;

pub use crate::utils::clock::{Clock, ManualClock, SystemClock};
pub use crate::utils::events::{EventHandler, EventManager};
pub use crate::utils::range::Range;
pub use crate::utils::scale::Scalable;
pub use crate::utils::task::TaskHandler;

pub mod clock;
pub mod events;
pub mod range;
pub mod scale;
pub mod task;
