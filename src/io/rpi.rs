//! Raspberry Pi backend
//!
//! Pin numbers are BCM. The occupancy line has an external pull-up on the
//! club switch; the lock line uses the SoC pull-down so a disconnected lock
//! contact reads as unlocked.

use crate::infra::error::HardwareError;
use crate::io::hardware::{DigitalInputs, InputLine, RegisterBus};
use rppal::gpio::{Gpio, InputPin};
use rppal::i2c::I2c;
use tracing::info;

pub struct RpiInputs {
    occupancy: InputPin,
    lock: InputPin,
}

impl RpiInputs {
    pub fn open(occupancy_pin: u8, lock_pin: u8) -> Result<Self, HardwareError> {
        let gpio = Gpio::new()?;
        let occupancy = gpio.get(occupancy_pin)?.into_input();
        let lock = gpio.get(lock_pin)?.into_input_pulldown();
        info!(occupancy_pin = %occupancy_pin, lock_pin = %lock_pin, "gpio_inputs_opened");
        Ok(Self { occupancy, lock })
    }
}

impl DigitalInputs for RpiInputs {
    fn read(&mut self, line: InputLine) -> Result<bool, HardwareError> {
        let pin = match line {
            InputLine::Occupancy => &self.occupancy,
            InputLine::Lock => &self.lock,
        };
        Ok(pin.is_high())
    }
}

pub struct RpiBus {
    i2c: I2c,
    slave: Option<u8>,
}

impl RpiBus {
    pub fn open(bus: u8) -> Result<Self, HardwareError> {
        let i2c = I2c::with_bus(bus)?;
        info!(bus = %bus, "i2c_bus_opened");
        Ok(Self { i2c, slave: None })
    }
}

impl RegisterBus for RpiBus {
    fn write(&mut self, device: u8, register: u8, value: u8) -> Result<(), HardwareError> {
        if self.slave != Some(device) {
            self.i2c.set_slave_address(u16::from(device))?;
            self.slave = Some(device);
        }
        self.i2c.smbus_write_byte(register, value)?;
        Ok(())
    }
}
