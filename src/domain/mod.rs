//! Domain models - core types shared by the controller
//!
//! - `RelayChannel` - logical relay outputs and their register bits
//! - `LightCombination` - the four traffic light states
//! - `SensorSample` - normalized occupancy and lock readings
//! - `TickReport` - per-tick summary printed on the console

pub mod types;

pub use types::{LightCombination, LightSet, RelayChannel, SensorSample, TickReport};
