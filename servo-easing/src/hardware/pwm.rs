use std::fmt::{Debug, Formatter};

use embedded_hal::pwm::SetDutyCycle;

use crate::errors::Error;
use crate::errors::HardwareError::DeviceNotFound;
use crate::hardware::{ActuatorBackend, SERVO_PERIOD_US};

/// A servo driven by a hardware PWM channel of the host microcontroller.
///
/// The channel must already run at the servo frame frequency (50Hz by default, see
/// [`Self::set_period`]): pulses are converted into duty cycle fractions of that period.
pub struct NativePwm<P: SetDutyCycle> {
    pin: P,
    label: String,
    period: u16,
}

impl<P: SetDutyCycle> NativePwm<P> {
    /// Creates a servo output over a PWM channel.
    ///
    /// # Parameters
    /// * `label`: how the channel is named in logs (ex: "GPIO9")
    /// * `pin`: the PWM channel
    pub fn new<S: Into<String>>(label: S, pin: P) -> Self {
        Self {
            pin,
            label: label.into(),
            period: SERVO_PERIOD_US,
        }
    }

    /// Returns the frame period in µs.
    pub fn get_period(&self) -> u16 {
        self.period
    }

    /// Sets the frame period in µs the PWM channel was configured with (default: 20000µs).
    pub fn set_period(mut self, period: u16) -> Self {
        self.period = period.max(1);
        self
    }

    fn write_duty(&mut self, pulse: u16) -> Result<(), P::Error> {
        self.pin
            .set_duty_cycle_fraction(pulse.min(self.period), self.period)
    }
}

impl<P: SetDutyCycle + Send> ActuatorBackend for NativePwm<P> {
    fn get_name(&self) -> String {
        format!("PWM({})", self.label)
    }

    fn probe(&mut self) -> bool {
        self.pin.max_duty_cycle() > 0
    }

    fn attach(&mut self, pulse: u16) -> Result<(), Error> {
        self.write_duty(pulse).map_err(|err| {
            log::debug!("{} attach failed: {:?}", self.get_name(), err);
            DeviceNotFound {
                device: self.get_name(),
            }
        })?;
        Ok(())
    }

    fn write_pulse(&mut self, pulse: u16) {
        if let Err(err) = self.write_duty(pulse) {
            log::warn!("{} failed to write {}µs: {:?}", self.get_name(), pulse, err);
        }
    }

    fn detach(&mut self) {
        if let Err(err) = self.pin.set_duty_cycle_fully_off() {
            log::warn!("{} failed to detach: {:?}", self.get_name(), err);
        }
    }
}

impl<P: SetDutyCycle> Debug for NativePwm<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePwm")
            .field("label", &self.label)
            .field("period", &self.period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockPwmPin;

    #[test]
    fn test_native_pwm_writes_duty() {
        let pin = MockPwmPin::new(20_000);
        let mut backend = NativePwm::new("GPIO9", pin.clone());
        assert_eq!(backend.get_name(), "PWM(GPIO9)");
        assert!(backend.probe());

        assert!(backend.attach(1500).is_ok());
        assert_eq!(pin.get_duty(), 1500);
        backend.write_pulse(2400);
        assert_eq!(pin.get_duty(), 2400);
        backend.detach();
        assert_eq!(pin.get_duty(), 0);
    }

    #[test]
    fn test_native_pwm_scales_to_resolution() {
        // A 16bits channel: 1500µs over 20000µs.
        let pin = MockPwmPin::new(u16::MAX);
        let mut backend = NativePwm::new("TIM1_CH1", pin.clone());
        backend.write_pulse(1500);
        assert_eq!(pin.get_duty(), 4915);
    }

    #[test]
    fn test_native_pwm_period() {
        let pin = MockPwmPin::new(10_000);
        let mut backend = NativePwm::new("GPIO3", pin.clone()).set_period(10_000);
        assert_eq!(backend.get_period(), 10_000);
        backend.write_pulse(12_000);
        assert_eq!(pin.get_duty(), 10_000, "Pulse is capped to the period");
    }

    #[test]
    fn test_native_pwm_missing() {
        let pin = MockPwmPin::new(0);
        let mut backend = NativePwm::new("GPIO0", pin);
        assert!(!backend.probe());
        assert_eq!(format!("{:?}", backend), "NativePwm { label: \"GPIO0\", period: 20000 }");
    }
}
