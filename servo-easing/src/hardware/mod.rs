//! Defines the servo outputs: anything able to hold a pulse width on a servo signal line.

use std::fmt::Debug;

use crate::errors::Error;

mod pca9685;
mod pwm;
mod soft_pwm;

pub use pca9685::{Pca9685, Pca9685Channel};
pub use pwm::NativePwm;
pub use soft_pwm::{SoftPwm, SoftPwmDriver};

/// The standard servo frame period in µs (50Hz).
pub const SERVO_PERIOD_US: u16 = 20_000;

/// A servo output able to hold a pulse width (in µs).
///
/// Implementations are chosen when a [`Servo`](crate::devices::Servo) is created and owned by it.
pub trait ActuatorBackend: Debug + Send {
    /// Returns a human-readable name for the output.
    fn get_name(&self) -> String;

    /// Checks whether the output is present and answering.
    fn probe(&mut self) -> bool;

    /// Starts driving the output at the given pulse width.
    ///
    /// # Errors
    /// * `InvalidHandle`: the handle designates no valid output.
    /// * `DeviceNotFound`: the underlying device did not answer.
    fn attach(&mut self, pulse: u16) -> Result<(), Error>;

    /// Sets the pulse width of an attached output. Writes are best effort: failures are logged.
    fn write_pulse(&mut self, pulse: u16);

    /// Stops driving the output: the servo goes limp.
    fn detach(&mut self) {}
}
