use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::errors::Error;
use crate::hardware::{ActuatorBackend, SERVO_PERIOD_US};

/// A servo driven by bit-banging a plain digital output.
///
/// The backend side only records the pulse to hold: the signal itself is generated by the paired
/// [`SoftPwmDriver`], whose [`frame`](SoftPwmDriver::frame) must be called in a loop by whoever
/// owns the pin (a dedicated thread for instance).
#[derive(Clone, Debug)]
pub struct SoftPwm {
    label: String,
    pulse: Arc<AtomicU16>,
    attached: Arc<AtomicBool>,
}

/// Generates the signal of a [`SoftPwm`] output, one frame at a time.
#[derive(Debug)]
pub struct SoftPwmDriver<P: OutputPin> {
    pin: P,
    period: u32,
    pulse: Arc<AtomicU16>,
    attached: Arc<AtomicBool>,
}

impl SoftPwm {
    /// Creates a software PWM output over a digital pin and returns it with its signal driver.
    pub fn new<S: Into<String>, P: OutputPin>(label: S, pin: P) -> (Self, SoftPwmDriver<P>) {
        let pulse = Arc::new(AtomicU16::new(0));
        let attached = Arc::new(AtomicBool::new(false));
        let backend = Self {
            label: label.into(),
            pulse: pulse.clone(),
            attached: attached.clone(),
        };
        let driver = SoftPwmDriver {
            pin,
            period: SERVO_PERIOD_US as u32,
            pulse,
            attached,
        };
        (backend, driver)
    }

    /// Returns the pulse width (in µs) currently held.
    pub fn get_pulse(&self) -> u16 {
        self.pulse.load(Ordering::SeqCst)
    }

    /// Returns whether the signal is generated.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl ActuatorBackend for SoftPwm {
    fn get_name(&self) -> String {
        format!("SoftPWM({})", self.label)
    }

    fn probe(&mut self) -> bool {
        true
    }

    fn attach(&mut self, pulse: u16) -> Result<(), Error> {
        self.pulse.store(pulse, Ordering::SeqCst);
        self.attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn write_pulse(&mut self, pulse: u16) {
        self.pulse.store(pulse, Ordering::SeqCst);
    }

    fn detach(&mut self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

impl<P: OutputPin> SoftPwmDriver<P> {
    /// Sets the frame period in µs (default: 20000µs).
    pub fn set_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Generates one frame of the signal: the pin is held high for the pulse width, then low until
    /// the end of the period. A detached output keeps the pin low for the whole frame.
    pub fn frame<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        let pulse = match self.attached.load(Ordering::SeqCst) {
            true => (self.pulse.load(Ordering::SeqCst) as u32).min(self.period),
            false => 0,
        };

        if pulse > 0 {
            self.pin.set_high()?;
            delay.delay_us(pulse);
        }
        self.pin.set_low()?;
        delay.delay_us(self.period - pulse);
        Ok(())
    }
}
