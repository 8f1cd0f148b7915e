//! Services - control logic and state management
//!
//! This module contains the decision logic and the loop that drives it:
//! - `power` - Power relay hysteresis with linger window
//! - `traffic_light` - Light combination state machine
//! - `publisher` - Occupancy status publishing with heartbeat
//! - `controller` - Fixed-cadence control loop and shutdown sequence

pub mod controller;
pub mod power;
pub mod publisher;
pub mod traffic_light;

// Re-export commonly used types
pub use controller::{Controller, LoopState};
pub use power::PowerHysteresis;
pub use publisher::StatusPublisher;
pub use traffic_light::TrafficLight;
