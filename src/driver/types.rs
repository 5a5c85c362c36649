use crate::config::DriverConfig;
use crate::entities::ClimateCall;
use crate::protocol::ReceiverStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Main driver state
#[derive(Debug, Clone, PartialEq)]
pub enum DriverState {
    /// Driver is initializing
    Initializing,
    /// Driver is running normally
    Running,
    /// Serial transport failing
    Error(String),
    /// Driver is shutting down
    ShuttingDown,
}

/// Commands accepted by a climate driver
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCommand {
    Control(ClimateCall),
    SelectOption { entity_id: String, option: String },
    SetSwitch { entity_id: String, state: bool },
    SensorValue { sensor_id: String, value: f32 },
    Shutdown,
}

/// Timing knobs resolved from [`DriverConfig`]
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub poll_interval: Duration,
    pub read_timeout: Duration,
    pub response_timeout: Duration,
    pub max_retries: u32,
    pub link_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl From<&DriverConfig> for DriverSettings {
    fn from(config: &DriverConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            response_timeout: Duration::from_millis(config.response_timeout_ms),
            max_retries: config.max_retries,
            link_timeout: Duration::from_millis(config.link_timeout_ms),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from(&DriverConfig::default())
    }
}

/// Control frame waiting for the unit to answer
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub frame: Vec<u8>,
    pub sent_at: Instant,
    pub attempts: u32,
}

/// Traffic counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverStats {
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub frames_sent: u64,
    pub resends: u64,
    pub failed_requests: u64,
    pub receiver: ReceiverStats,
    pub last_rx_at: Option<DateTime<Utc>>,
    pub last_tx_at: Option<DateTime<Utc>>,
}
