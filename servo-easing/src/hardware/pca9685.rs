// ***********
// All information are relative to PCA9685 datasheets:
// https://www.digikey.jp/htmldatasheets/production/2459480/0/0/1/pca9685.html

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use embedded_hal::i2c::{Error as I2cError, I2c};
use parking_lot::Mutex;

use crate::errors::HardwareError::{DeviceNotFound, InvalidHandle};
use crate::errors::{Error, Unknown};
use crate::hardware::ActuatorBackend;

/// A PCA9685 16-channel I2C PWM expander.
///
/// The chip is a cheap-clone handle: every [`Pca9685Channel`] holds one and all of them share the
/// same bus access.
pub struct Pca9685<I2C> {
    chip: Arc<Mutex<Chip<I2C>>>,
}

struct Chip<I2C> {
    i2c: I2C,
    // Address (default 0x40).
    address: u8,
    // Frequency in Hz (default 50Hz).
    frequency: u16,
    initialized: bool,
}

/// One output channel (0-15) of a [`Pca9685`].
#[derive(Clone)]
pub struct Pca9685Channel<I2C> {
    chip: Pca9685<I2C>,
    channel: u8,
}

impl<I2C> Clone for Pca9685<I2C> {
    fn clone(&self) -> Self {
        Self {
            chip: self.chip.clone(),
        }
    }
}

impl<I2C: I2c> Pca9685<I2C> {
    pub const DEFAULT_ADDRESS: u8 = 0x40;
    pub const CHANNELS: u8 = 16;

    // Registers.
    const MODE1: u8 = 0x0;
    const PRESCALE: u8 = 0xFE;
    const BASE: u8 = 0x06;
    // Magic bits.
    const SLEEP: u8 = 0x10;
    const RESET: u8 = 0x00;
    const RESTART: u8 = 0x80;
    const AUTO_INCREMENT: u8 = 0x20;
    const FULL_OFF: u16 = 0x1000;
    // PCA9685 physical constraints.
    const MIN_FREQUENCY: u16 = 24; // Minimum frequency in Hz
    const MAX_FREQUENCY: u16 = 1526; // Maximum frequency in Hz
    const OSC_CLOCK: f32 = 25_000_000.0; // PCA9685 clock frequency
    const RESOLUTION: u32 = 4096;

    /// Creates a PCA9685 handle on a bus. Nothing is sent until a channel attaches or
    /// [`Self::set_frequency`] is called.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            chip: Arc::new(Mutex::new(Chip {
                i2c,
                address,
                frequency: 50,
                initialized: false,
            })),
        }
    }

    /// Returns the chip I2C address.
    pub fn get_address(&self) -> u8 {
        self.chip.lock().address
    }

    /// Returns the PWM frequency in Hz.
    pub fn get_frequency(&self) -> u16 {
        self.chip.lock().frequency
    }

    /// Returns a servo output on one of the 16 channels.
    ///
    /// The channel number is only checked when the output attaches.
    pub fn channel(&self, channel: u8) -> Pca9685Channel<I2C> {
        Pca9685Channel {
            chip: self.clone(),
            channel,
        }
    }

    /// Sets the PWM frequency (in Hz) for the entire PCA9685: from 24 to 1526 Hz.
    pub fn set_frequency(&self, frequency: u16) -> Result<(), Error> {
        if !(Self::MIN_FREQUENCY..=Self::MAX_FREQUENCY).contains(&frequency) {
            return Err(Unknown {
                info: format!(
                    "Frequency must be between {} and {} Hz",
                    Self::MIN_FREQUENCY,
                    Self::MAX_FREQUENCY
                ),
            });
        };

        let mut chip = self.chip.lock();
        chip.frequency = frequency;
        chip.initialized = false;

        // 7.3.1 Mode register 1, MODE1 - Reset / Sleep
        chip.write_to_reg(Self::MODE1, Self::RESET)?;
        chip.write_to_reg(Self::MODE1, Self::SLEEP)?;

        // 7.3.5 PWM frequency PRE_SCALE
        // prescale = round((osc_clock / (4096 x rate)) - 1) - with PCA9685 clock at 25Mhz
        let prescale = ((Self::OSC_CLOCK / (4096.0 * frequency as f32)) + 0.5 - 1.0)
            .clamp(3.0, 255.0) as u8;
        chip.write_to_reg(Self::PRESCALE, prescale)?;

        // Wake up and restart in auto-increment mode.
        chip.write_to_reg(Self::MODE1, Self::RESET)?;
        chip.write_to_reg(Self::MODE1, Self::RESTART | Self::AUTO_INCREMENT)?;
        chip.initialized = true;

        log::debug!(
            "PCA9685@0x{:02X} running at {}Hz (prescale={})",
            chip.address,
            frequency,
            prescale
        );
        Ok(())
    }

    /// Writes a single register.
    pub fn write_to_reg(&self, register: u8, value: u8) -> Result<(), Error> {
        self.chip.lock().write_to_reg(register, value)
    }

    /// Reads a single register.
    pub fn read_from_reg(&self, register: u8) -> Result<u8, Error> {
        self.chip.lock().read_from_reg(register)
    }

    /// Initializes the chip at its current frequency unless already done.
    fn ensure_initialized(&self) -> Result<(), Error> {
        let (initialized, frequency) = {
            let chip = self.chip.lock();
            (chip.initialized, chip.frequency)
        };
        match initialized {
            true => Ok(()),
            false => self.set_frequency(frequency),
        }
    }

    /// Holds a pulse width (in µs) on a channel.
    fn write_pulse(&self, channel: u8, pulse: u16) -> Result<(), Error> {
        let mut chip = self.chip.lock();
        let period = 1_000_000 / chip.frequency.max(1) as u32;
        let off = (pulse as u32 * Self::RESOLUTION / period).min(Self::RESOLUTION - 1) as u16;
        chip.write_channel(channel, 0, off)
    }

    /// Switches a channel fully off.
    fn write_full_off(&self, channel: u8) -> Result<(), Error> {
        self.chip.lock().write_channel(channel, 0, Self::FULL_OFF)
    }
}

impl<I2C: I2c> Chip<I2C> {
    fn name(&self) -> String {
        format!("PCA9685@0x{:02X}", self.address)
    }

    fn bus_error<E: I2cError>(&self, err: E) -> Error {
        log::debug!("{} bus error: {:?}", self.name(), err.kind());
        DeviceNotFound { device: self.name() }.into()
    }

    fn write_to_reg(&mut self, register: u8, value: u8) -> Result<(), Error> {
        let address = self.address;
        self.i2c
            .write(address, &[register, value])
            .map_err(|err| self.bus_error(err))
    }

    fn read_from_reg(&mut self, register: u8) -> Result<u8, Error> {
        let address = self.address;
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(address, &[register], &mut buffer)
            .map_err(|err| self.bus_error(err))?;
        Ok(buffer[0])
    }

    // 7.3.3 LED output and PWM control
    // The register corresponding to the channel (0-15) starts at BASE: see table 7 of the datasheet.
    fn write_channel(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Error> {
        if channel >= Pca9685::<I2C>::CHANNELS {
            return Err(InvalidHandle {
                device: self.name(),
                channel,
            }
            .into());
        }
        let address = self.address;
        let payload = [
            Pca9685::<I2C>::BASE + 4 * channel,
            on as u8,
            (on >> 8) as u8,
            off as u8,
            (off >> 8) as u8,
        ];
        log::trace!("{} write: [on:{}, off:{}] {:02X?}", self.name(), on, off, payload);
        self.i2c
            .write(address, &payload)
            .map_err(|err| self.bus_error(err))
    }
}

impl<I2C: I2c + Send + 'static> ActuatorBackend for Pca9685Channel<I2C> {
    fn get_name(&self) -> String {
        format!("{}#{}", self.chip, self.channel)
    }

    fn probe(&mut self) -> bool {
        self.chip.read_from_reg(Pca9685::<I2C>::MODE1).is_ok()
    }

    fn attach(&mut self, pulse: u16) -> Result<(), Error> {
        if self.channel >= Pca9685::<I2C>::CHANNELS {
            return Err(InvalidHandle {
                device: self.chip.to_string(),
                channel: self.channel,
            }
            .into());
        }
        self.chip.ensure_initialized()?;
        self.chip.write_pulse(self.channel, pulse)
    }

    fn write_pulse(&mut self, pulse: u16) {
        if let Err(err) = self.chip.write_pulse(self.channel, pulse) {
            log::warn!("{} failed to write {}µs: {}", self.get_name(), pulse, err);
        }
    }

    fn detach(&mut self) {
        if let Err(err) = self.chip.write_full_off(self.channel) {
            log::warn!("{} failed to detach: {}", self.get_name(), err);
        }
    }
}

impl<I2C> Pca9685Channel<I2C> {
    /// Returns the channel number.
    pub fn get_channel(&self) -> u8 {
        self.channel
    }
}

impl<I2C> Display for Pca9685<I2C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PCA9685@0x{:02X}", self.chip.lock().address)
    }
}

impl<I2C> Debug for Pca9685<I2C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let chip = self.chip.lock();
        f.debug_struct("Pca9685")
            .field("address", &chip.address)
            .field("frequency", &chip.frequency)
            .field("initialized", &chip.initialized)
            .finish()
    }
}

impl<I2C> Debug for Pca9685Channel<I2C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pca9685Channel")
            .field("chip", &self.chip)
            .field("channel", &self.channel)
            .finish()
    }
}
