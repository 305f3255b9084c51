//! Mocked outputs, bus and pins: useful for tests and for running the demos without hardware.

mod backend;
mod i2c;
mod pins;

pub use backend::MockBackend;
pub use i2c::MockI2c;
pub use pins::{MockDelay, MockOutputPin, MockPwmPin};
