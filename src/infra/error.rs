//! Error taxonomy for the control loop
//!
//! Hardware errors are fatal: guessing a sensor value or leaving a relay in
//! an unknown position could drive an unsafe output. Publish errors are not,
//! the loop logs them and carries on.

use thiserror::Error;

/// Error reported by a hardware collaborator (GPIO, I2C)
pub type HardwareError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal errors raised by the control loop
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("sensor read failed on {line} line: {source}")]
    HardwareRead {
        line: &'static str,
        #[source]
        source: HardwareError,
    },

    #[error("relay bank write failed: {0}")]
    HardwareWrite(#[source] HardwareError),

    #[error("invalid relay channel: bit {0}")]
    InvalidChannel(u8),

    #[error("control loop is shut down")]
    ShutDown,
}

impl ControllerError {
    /// Subsystem name used in logs and exit messages
    pub fn subsystem(&self) -> &'static str {
        match self {
            ControllerError::HardwareRead { .. } => "sensors",
            ControllerError::HardwareWrite(_) | ControllerError::InvalidChannel(_) => "relay_bank",
            ControllerError::ShutDown => "controller",
        }
    }
}

/// Non-fatal failure to hand a status message to the message bus
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("mqtt client rejected publish: {0}")]
    Client(String),

    #[error("message bus is stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_names() {
        let read = ControllerError::HardwareRead { line: "occupancy", source: "boom".into() };
        assert_eq!(read.subsystem(), "sensors");
        assert_eq!(ControllerError::InvalidChannel(5).subsystem(), "relay_bank");
        assert_eq!(ControllerError::HardwareWrite("nack".into()).subsystem(), "relay_bank");
    }

    #[test]
    fn test_read_error_message_names_line() {
        let err = ControllerError::HardwareRead { line: "lock", source: "gpio busy".into() };
        assert_eq!(err.to_string(), "sensor read failed on lock line: gpio busy");
    }
}
