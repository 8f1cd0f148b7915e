//! Infrastructure - configuration and error types
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `error` - Fatal and non-fatal error taxonomy

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, HardwareBackend, PowerTrigger};
pub use error::{ControllerError, HardwareError, PublishError};
