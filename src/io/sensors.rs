//! Occupancy and lock sensing

use crate::domain::types::SensorSample;
use crate::infra::error::ControllerError;
use crate::io::hardware::{DigitalInputs, InputLine};

/// Reads both input lines once per tick and normalizes polarity
pub struct SensorSampler {
    inputs: Box<dyn DigitalInputs>,
}

impl SensorSampler {
    pub fn new(inputs: Box<dyn DigitalInputs>) -> Self {
        Self { inputs }
    }

    /// Occupancy is active-low, lock is active-high. A failed read is
    /// returned as-is, never replaced by a guessed value.
    pub fn sample(&mut self) -> Result<SensorSample, ControllerError> {
        let occupied = !self.read(InputLine::Occupancy)?;
        let locked = self.read(InputLine::Lock)?;
        Ok(SensorSample { occupied, locked })
    }

    fn read(&mut self, line: InputLine) -> Result<bool, ControllerError> {
        self.inputs
            .read(line)
            .map_err(|source| ControllerError::HardwareRead { line: line.as_str(), source })
    }
}
