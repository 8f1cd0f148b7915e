//! Relay bank behind an I2C port expander
//!
//! The relays are wired active-low: a cleared bit energizes the channel.
//! The bank keeps its own image of the output register and writes the
//! whole byte on every change; the hardware is never read back.

use crate::domain::types::{LightSet, RelayChannel};
use crate::infra::error::ControllerError;
use crate::io::hardware::{RegisterBus, RELAY_ADDRESS, RELAY_REGISTER};
use tracing::{debug, info, warn};

/// Register image with every channel (and every unused bit) off
pub const ALL_OFF: u8 = 0xFF;

pub struct RelayBank {
    bus: Box<dyn RegisterBus>,
    image: u8,
}

impl RelayBank {
    /// Take ownership of the bus and switch every channel off
    pub fn new(bus: Box<dyn RegisterBus>) -> Result<Self, ControllerError> {
        let mut bank = Self { bus, image: ALL_OFF };
        bank.write_image()?;
        info!(image = %format!("{:#010b}", bank.image), "relay_bank_initialized");
        Ok(bank)
    }

    /// Last register value handed to the bus
    pub fn image(&self) -> u8 {
        self.image
    }

    /// Whether the image currently energizes `channel`
    pub fn is_energized(&self, channel: RelayChannel) -> bool {
        self.image & (1 << channel.bit()) == 0
    }

    /// Energize or release a channel, writing the full register
    pub fn set(&mut self, channel: RelayChannel, energized: bool) -> Result<(), ControllerError> {
        let mask = 1u8 << channel.bit();
        if energized {
            self.image &= !mask;
        } else {
            self.image |= mask;
        }
        debug!(channel = %channel, energized = %energized, "relay_set");
        self.write_image()
    }

    /// Same as `set`, addressed by raw bit index
    ///
    /// Bits that are not bound to a channel are rejected before the image is
    /// touched.
    pub fn set_index(&mut self, bit: u8, energized: bool) -> Result<(), ControllerError> {
        let channel = RelayChannel::from_bit(bit).ok_or(ControllerError::InvalidChannel(bit))?;
        self.set(channel, energized)
    }

    /// Switch all three lamps to match `lights`
    pub fn apply_lights(&mut self, lights: LightSet) -> Result<(), ControllerError> {
        for (channel, lit) in lights.channels() {
            self.set(channel, lit)?;
        }
        Ok(())
    }

    /// Drive power on, red and green on, yellow off
    ///
    /// Every channel is attempted even if an earlier write failed; the first
    /// error is returned.
    pub fn force_safe_state(&mut self) -> Result<(), ControllerError> {
        let mut first_error = None;
        let targets =
            std::iter::once((RelayChannel::Power, true)).chain(LightSet::SHUTDOWN.channels());
        for (channel, energized) in targets {
            if let Err(e) = self.set(channel, energized) {
                warn!(channel = %channel, error = %e, "relay_safe_state_write_failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_image(&mut self) -> Result<(), ControllerError> {
        self.bus
            .write(RELAY_ADDRESS, RELAY_REGISTER, self.image)
            .map_err(ControllerError::HardwareWrite)
    }
}
