//! Defines the millisecond time sources used to time motions.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic source of milliseconds.
///
/// The origin is arbitrary: only differences between two readings matter.
pub trait Clock: Debug + Send + Sync {
    /// Returns the current time in milliseconds.
    fn now(&self) -> u64;
}

/// Real time, counted from the clock creation.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// A settable clock: time only flows when told to.
///
/// Clones share the same time, so a test can keep a handle while a scheduler reads another.
///
/// # Example
/// ```
/// use servo_easing::utils::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// clock.advance(20);
/// assert_eq!(clock.now(), 20);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock starting at the given time.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Moves the time forward and returns the new time.
    pub fn advance(&self, millis: u64) -> u64 {
        self.millis.fetch_add(millis, Ordering::SeqCst) + millis
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
