pub use crate::devices::servo::{Direction, Servo, ServoEvent};

mod servo;
