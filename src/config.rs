//! Configuration management for acbridge
//!
//! This module handles loading, validation, and management of the bridge
//! configuration from YAML files. The file declares UART buses, external
//! sensors and climate devices the same way a firmware YAML would:
//!
//! ```yaml
//! uart:
//!   - id: uart_bus
//!     port: /dev/ttyS1
//! climate:
//!   - id: living_room
//!     platform: gree_ac
//!     current_temperature_sensor: room_temp
//! ```
//!
//! Cross-references between declarations are resolved by
//! [`crate::components::build_components`]; `validate` only checks
//! per-field constraints.

use crate::error::{AcBridgeError, Result};
use crate::models::Model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Serial buses available to climate devices
    #[serde(rename = "uart")]
    pub uarts: Vec<UartConfig>,

    /// Externally fed sensors (e.g. a room thermometer)
    #[serde(rename = "sensor")]
    pub sensors: Vec<SensorConfig>,

    /// Climate devices
    #[serde(rename = "climate")]
    pub climates: Vec<ClimateConfig>,

    /// Driver timing and retry behaviour
    pub driver: DriverConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server configuration
    pub web: WebConfig,
}

/// Serial port declaration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UartConfig {
    /// Identifier referenced by `uart_id`
    pub id: String,

    /// Device path, e.g. /dev/ttyUSB0
    pub port: String,

    /// Baud rate
    #[serde(default = "defaults::baud_rate")]
    pub baud_rate: u32,

    /// Data bits (5-8)
    #[serde(default = "defaults::data_bits")]
    pub data_bits: u8,

    /// Parity (none, even, odd)
    #[serde(default = "defaults::parity")]
    pub parity: String,

    /// Stop bits (1 or 2)
    #[serde(default = "defaults::stop_bits")]
    pub stop_bits: u8,
}

/// External sensor declaration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Unit of measurement
    #[serde(default = "defaults::temperature_unit")]
    pub unit_of_measurement: String,
}

/// Climate device declaration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClimateConfig {
    pub id: String,

    /// Device model
    pub platform: Model,

    /// Display name; the model default is used when omitted
    #[serde(default)]
    pub name: Option<String>,

    /// UART the unit is wired to; may be omitted when exactly one is declared
    #[serde(default)]
    pub uart_id: Option<String>,

    /// Sensor overriding the unit's own indoor temperature reading
    #[serde(default)]
    pub current_temperature_sensor: Option<String>,

    /// Per-entity overrides keyed by configuration key (e.g. `light_switch`)
    #[serde(default)]
    pub entities: BTreeMap<String, EntityOverride>,
}

/// Overrides for a generated child entity
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EntityOverride {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Driver timing configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DriverConfig {
    /// Main loop tick in milliseconds
    pub poll_interval_ms: u64,

    /// Maximum gap between bytes of one frame
    pub read_timeout_ms: u64,

    /// How long to wait for a unit report after sending a change
    pub response_timeout_ms: u64,

    /// Send attempts per change before giving up
    pub max_retries: u32,

    /// Mark a device unavailable after this long without a valid frame
    pub link_timeout_ms: u64,

    /// Delay before reopening a failed serial port
    pub reconnect_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Initial level for the web log stream (defaults to `level`)
    pub web_level: Option<String>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "acbridge.yaml",
            "/data/acbridge.yaml",
            "/etc/acbridge/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate per-field constraints
    pub fn validate(&self) -> Result<()> {
        for (i, uart) in self.uarts.iter().enumerate() {
            uart.validate(i)?;
        }

        for (i, sensor) in self.sensors.iter().enumerate() {
            if sensor.id.trim().is_empty() {
                return Err(AcBridgeError::validation(
                    format!("sensor[{i}].id"),
                    "Identifier cannot be empty",
                ));
            }
        }

        for (i, climate) in self.climates.iter().enumerate() {
            if climate.id.trim().is_empty() {
                return Err(AcBridgeError::validation(
                    format!("climate[{i}].id"),
                    "Identifier cannot be empty",
                ));
            }
            for (key, entity) in &climate.entities {
                if entity.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
                    return Err(AcBridgeError::validation(
                        format!("climate[{i}].entities.{key}.id"),
                        "Identifier cannot be empty",
                    ));
                }
            }
        }

        self.driver.validate()?;

        if self.web.port == 0 {
            return Err(AcBridgeError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl UartConfig {
    fn validate(&self, index: usize) -> Result<()> {
        let field = |name: &str| format!("uart[{index}].{name}");

        if self.id.trim().is_empty() {
            return Err(AcBridgeError::validation(
                field("id"),
                "Identifier cannot be empty",
            ));
        }
        if self.port.trim().is_empty() {
            return Err(AcBridgeError::validation(
                field("port"),
                "Port cannot be empty",
            ));
        }
        if self.baud_rate == 0 {
            return Err(AcBridgeError::validation(
                field("baud_rate"),
                "Must be greater than 0",
            ));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(AcBridgeError::validation(
                field("data_bits"),
                "Must be between 5 and 8",
            ));
        }
        if !matches!(
            self.parity.to_ascii_lowercase().as_str(),
            "none" | "even" | "odd"
        ) {
            return Err(AcBridgeError::validation(
                field("parity"),
                "Must be one of none, even, odd",
            ));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            return Err(AcBridgeError::validation(
                field("stop_bits"),
                "Must be 1 or 2",
            ));
        }
        Ok(())
    }
}

impl DriverConfig {
    fn validate(&self) -> Result<()> {
        let positive = [
            ("driver.poll_interval_ms", self.poll_interval_ms),
            ("driver.read_timeout_ms", self.read_timeout_ms),
            ("driver.response_timeout_ms", self.response_timeout_ms),
            ("driver.link_timeout_ms", self.link_timeout_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(AcBridgeError::validation(field, "Must be greater than 0"));
            }
        }
        if self.max_retries == 0 {
            return Err(AcBridgeError::validation(
                "driver.max_retries",
                "At least one attempt is required",
            ));
        }
        Ok(())
    }
}
