//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. Default: configuration.toml next to the executable
//!
//! A missing file is not an error, every option has a default. A file that
//! exists but cannot be parsed, or enables MQTT auth without credentials,
//! is fatal at startup.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "configuration.toml";

/// Where the sensors and relay bank live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareBackend {
    /// Raspberry Pi GPIO + I2C
    Rpi,
    /// In-memory stand-in for dry runs
    Sim,
}

/// What keeps the auxiliary power relay energized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerTrigger {
    /// Power follows club occupancy
    Occupancy,
    /// Power follows the door lock being open
    Unlocked,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            auth: false,
            user: None,
            password: None,
            topic: default_mqtt_topic(),
            client_id: None,
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "/public/eden/clubstatus".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct HardwareConfig {
    #[serde(default = "default_backend")]
    pub backend: HardwareBackend,
    /// I2C bus the relay port expander sits on
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,
    /// BCM number of the occupancy input (board pin 7)
    #[serde(default = "default_occupancy_pin")]
    pub occupancy_pin: u8,
    /// BCM number of the lock input (board pin 11)
    #[serde(default = "default_lock_pin")]
    pub lock_pin: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            i2c_bus: default_i2c_bus(),
            occupancy_pin: default_occupancy_pin(),
            lock_pin: default_lock_pin(),
        }
    }
}

fn default_backend() -> HardwareBackend {
    HardwareBackend::Rpi
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_occupancy_pin() -> u8 {
    4
}

fn default_lock_pin() -> u8 {
    17
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowerConfig {
    #[serde(default = "default_power_trigger")]
    pub trigger: PowerTrigger,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self { trigger: default_power_trigger() }
    }
}

fn default_power_trigger() -> PowerTrigger {
    PowerTrigger::Occupancy
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub power: PowerConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_credentials: Option<(String, String)>,
    mqtt_topic: String,
    mqtt_client_id: String,
    mqtt_keep_alive_secs: u64,
    hardware_backend: HardwareBackend,
    i2c_bus: u8,
    occupancy_pin: u8,
    lock_pin: u8,
    power_trigger: PowerTrigger,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_host: default_mqtt_host(),
            mqtt_port: default_mqtt_port(),
            mqtt_credentials: None,
            mqtt_topic: default_mqtt_topic(),
            mqtt_client_id: format!("clubstatus-{}", std::process::id()),
            mqtt_keep_alive_secs: default_keep_alive_secs(),
            hardware_backend: default_backend(),
            i2c_bus: default_i2c_bus(),
            occupancy_pin: default_occupancy_pin(),
            lock_pin: default_lock_pin(),
            power_trigger: default_power_trigger(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Default config file location: next to the running executable
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse configuration from TOML text; `origin` is kept for logging
    pub fn parse(content: &str, origin: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", origin))?;
        Self::from_toml(toml_config, origin)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(config_file = %path.display(), "config_file_missing_using_defaults");
                Ok(Self::default())
            }
            _ => Self::from_file(path),
        }
    }

    fn from_toml(toml_config: TomlConfig, origin: &str) -> anyhow::Result<Self> {
        let mqtt = toml_config.mqtt;

        let mqtt_credentials = if mqtt.auth {
            match (mqtt.user, mqtt.password) {
                (Some(user), Some(password)) => Some((user, password)),
                (None, _) => bail!("{}: mqtt.auth is enabled but mqtt.user is missing", origin),
                (_, None) => {
                    bail!("{}: mqtt.auth is enabled but mqtt.password is missing", origin)
                }
            }
        } else {
            None
        };

        if mqtt.topic.is_empty() {
            bail!("{}: mqtt.topic must not be empty", origin);
        }

        let hardware = toml_config.hardware;
        if hardware.occupancy_pin == hardware.lock_pin {
            bail!(
                "{}: hardware.occupancy_pin and hardware.lock_pin are both {}",
                origin,
                hardware.lock_pin
            );
        }

        Ok(Self {
            mqtt_host: mqtt.host,
            mqtt_port: mqtt.port,
            mqtt_credentials,
            mqtt_topic: mqtt.topic,
            mqtt_client_id: mqtt
                .client_id
                .unwrap_or_else(|| format!("clubstatus-{}", std::process::id())),
            mqtt_keep_alive_secs: mqtt.keep_alive_secs,
            hardware_backend: hardware.backend,
            i2c_bus: hardware.i2c_bus,
            occupancy_pin: hardware.occupancy_pin,
            lock_pin: hardware.lock_pin,
            power_trigger: toml_config.power.trigger,
            config_file: origin.to_string(),
        })
    }

    // Getters for all config fields
    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    /// Username and password, present only when auth is enabled
    pub fn mqtt_credentials(&self) -> Option<(&str, &str)> {
        self.mqtt_credentials.as_ref().map(|(u, p)| (u.as_str(), p.as_str()))
    }

    pub fn mqtt_topic(&self) -> &str {
        &self.mqtt_topic
    }

    pub fn mqtt_client_id(&self) -> &str {
        &self.mqtt_client_id
    }

    pub fn mqtt_keep_alive_secs(&self) -> u64 {
        self.mqtt_keep_alive_secs
    }

    pub fn hardware_backend(&self) -> HardwareBackend {
        self.hardware_backend
    }

    pub fn i2c_bus(&self) -> u8 {
        self.i2c_bus
    }

    pub fn occupancy_pin(&self) -> u8 {
        self.occupancy_pin
    }

    pub fn lock_pin(&self) -> u8 {
        self.lock_pin
    }

    pub fn power_trigger(&self) -> PowerTrigger {
        self.power_trigger
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to force a hardware backend (e.g. `--simulate`)
    pub fn with_hardware_backend(mut self, backend: HardwareBackend) -> Self {
        self.hardware_backend = backend;
        self
    }
}
