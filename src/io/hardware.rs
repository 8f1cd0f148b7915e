//! Hardware collaborator interfaces
//!
//! The controller only needs two raw digital reads and a single I2C register
//! write. Backends live in `rpi` (real hardware) and `sim` (in memory).

use crate::infra::error::HardwareError;

/// I2C address of the relay port expander
pub const RELAY_ADDRESS: u8 = 0x20;

/// Output register written with the full relay image
pub const RELAY_REGISTER: u8 = 0x06;

/// Raw digital input lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    /// Electrically low while the club is occupied
    Occupancy,
    /// Electrically high while the door is locked, pulled down otherwise
    Lock,
}

impl InputLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputLine::Occupancy => "occupancy",
            InputLine::Lock => "lock",
        }
    }
}

/// Source of raw digital input levels
pub trait DigitalInputs: Send {
    /// Read the electrical level of a line, `true` meaning high
    fn read(&mut self, line: InputLine) -> Result<bool, HardwareError>;
}

/// Register write primitive of the I2C bus driver
pub trait RegisterBus: Send {
    fn write(&mut self, device: u8, register: u8, value: u8) -> Result<(), HardwareError>;
}
