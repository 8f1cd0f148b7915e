//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `hardware` - Collaborator traits for digital inputs and the I2C bus
//! - `rpi` - Raspberry Pi GPIO/I2C backend
//! - `sim` - In-memory backend for dry runs and tests
//! - `relay_bank` - Active-low relay register image and writes
//! - `sensors` - Occupancy/lock sampling with polarity normalization
//! - `mqtt` - MQTT status publisher

pub mod hardware;
pub mod mqtt;
pub mod relay_bank;
#[cfg(target_os = "linux")]
pub mod rpi;
pub mod sensors;
pub mod sim;

// Re-export commonly used types
pub use mqtt::{MqttStatusSink, StatusSink};
pub use relay_bank::RelayBank;
pub use sensors::SensorSampler;
