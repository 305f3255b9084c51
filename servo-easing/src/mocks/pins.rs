use std::convert::Infallible;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use parking_lot::Mutex;

/// Mock PWM channel for testing purposes: clones share the duty cycle.
#[derive(Clone, Debug)]
pub struct MockPwmPin {
    max_duty: u16,
    duty: Arc<Mutex<u16>>,
}

impl MockPwmPin {
    /// Creates a channel of the given resolution. A resolution of 0 mimics a missing channel.
    pub fn new(max_duty: u16) -> Self {
        Self {
            max_duty,
            duty: Arc::new(Mutex::new(0)),
        }
    }

    pub fn get_duty(&self) -> u16 {
        *self.duty.lock()
    }
}

impl pwm::ErrorType for MockPwmPin {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwmPin {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        *self.duty.lock() = duty;
        Ok(())
    }
}

/// Mock digital output for testing purposes: records every level set.
#[derive(Clone, Debug, Default)]
pub struct MockOutputPin {
    transitions: Arc<Mutex<Vec<bool>>>,
}

impl MockOutputPin {
    /// Returns every level set so far (`true` for high).
    pub fn get_transitions(&self) -> Vec<bool> {
        self.transitions.lock().clone()
    }

    pub fn is_high(&self) -> bool {
        self.transitions.lock().last().copied().unwrap_or(false)
    }
}

impl digital::ErrorType for MockOutputPin {
    type Error = Infallible;
}

impl OutputPin for MockOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.transitions.lock().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.transitions.lock().push(true);
        Ok(())
    }
}

/// Mock delay for testing purposes: records the delays instead of sleeping.
#[derive(Clone, Debug, Default)]
pub struct MockDelay {
    delays: Arc<Mutex<Vec<u32>>>,
}

impl MockDelay {
    /// Returns every delay requested, in µs.
    pub fn get_delays_us(&self) -> Vec<u32> {
        self.delays.lock().clone()
    }

    /// Returns the sum of every delay requested, in µs.
    pub fn get_elapsed_us(&self) -> u64 {
        self.delays.lock().iter().map(|delay| *delay as u64).sum()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.lock().push(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.lock().push(us);
    }
}
