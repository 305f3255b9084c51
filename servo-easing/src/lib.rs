#![doc(html_root_url = "https://docs.rs/servo-easing/0.1.0")]

//! <h1 align="center">SERVO-EASING - Smooth servo motion in Rust</h1>
//! <div style="text-align:center;font-style:italic;">Servo-Easing moves hobby servos along easing curves, in the background, over native PWM pins or PWM expanders.</div>
//! <br/>
//!
//! # Features
//!
//! - Drive a [`Servo`](devices::Servo) through any [`ActuatorBackend`](hardware::ActuatorBackend):
//!   a native [`NativePwm`](hardware::NativePwm) channel, a bit-banged [`SoftPwm`](hardware::SoftPwm)
//!   pin or a [`Pca9685`](hardware::Pca9685) channel.
//! - Describe moves by target and speed or duration with [`MoveRequest`](motion::MoveRequest),
//!   shaped by any of the 31 built-in [`Easing`](motion::Easing) curves (or your own).
//! - Let a [`MotionScheduler`](motion::MotionScheduler) tick every servo: either in background at
//!   a fixed interval, or when your own loop asks for it.
//! - Start several moves that finish together with
//!   [`MotionScheduler::synchronize`](motion::MotionScheduler::synchronize).
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! servo-easing = "0.1.0"
//! ```
//!
//! The following code sweeps a servo back and forth, eased, while the background ticker moves it.
//! ```rust
//! use servo_easing::devices::Servo;
//! use servo_easing::errors::Error;
//! use servo_easing::hardware::ActuatorBackend;
//! use servo_easing::motion::{Easing, MotionScheduler, MoveRequest};
//!
//! // Any ActuatorBackend goes: see the `hardware` module for real ones.
//! #[derive(Debug)]
//! struct Printer;
//!
//! impl ActuatorBackend for Printer {
//!     fn get_name(&self) -> String { String::from("printer") }
//!     fn probe(&mut self) -> bool { true }
//!     fn attach(&mut self, _: u16) -> Result<(), Error> { Ok(()) }
//!     fn write_pulse(&mut self, pulse: u16) { println!("{}µs", pulse) }
//! }
//!
//! #[servo_easing::runtime]
//! async fn main() {
//!     let scheduler = MotionScheduler::default();
//!
//!     let servo = Servo::new(&scheduler, Printer, 0.0)
//!         .unwrap()
//!         .set_easing(Easing::CubicInOut);
//!
//!     servo.ease_to(MoveRequest::to(180.0).with_duration(200)).await.unwrap();
//!     servo.ease_to(MoveRequest::to(0.0).with_speed(900)).await.unwrap();
//! }
//! ```
//!
//! # Feature flags
//!
//! - **serde** -- Enables serialize/deserialize capabilities for requests, curves and configurations.
//! - **mocks** -- Provides mocked backends, buses and pins (useful for tests mostly).

#[cfg(test)]
extern crate self as servo_easing;

pub mod devices;
pub mod errors;
pub mod hardware;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod motion;
pub mod utils;

pub use servo_easing_macros::runtime;
