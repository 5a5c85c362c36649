use super::{ClimateDriver, DriverState, DriverStats};
use crate::entities::{ClimateState, ClimateTraits, SelectEntity, SwitchEntity};
use crate::models::Model;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Published view of one climate device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub name: String,
    pub model: Option<Model>,
    pub uart_id: Option<String>,
    /// True while the unit answers on its UART
    pub available: bool,
    pub driver_state: String,
    pub uart_connected: Option<bool>,
    pub climate: ClimateState,
    pub traits: Option<ClimateTraits>,
    pub selects: Vec<SelectEntity>,
    pub switches: Vec<SwitchEntity>,
    pub current_temperature_sensor: Option<String>,
    pub awaiting_response: bool,
    pub stats: DriverStats,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            id: String::new(),
            name: String::new(),
            model: None,
            uart_id: None,
            available: false,
            driver_state: "Initializing".to_string(),
            uart_connected: None,
            climate: ClimateState::default(),
            traits: None,
            selects: Vec::new(),
            switches: Vec::new(),
            current_temperature_sensor: None,
            awaiting_response: false,
            stats: DriverStats::default(),
        }
    }
}

fn driver_state_label(state: &DriverState) -> String {
    match state {
        DriverState::Initializing => "Initializing".to_string(),
        DriverState::Running => "Running".to_string(),
        DriverState::Error(msg) => format!("Error: {}", msg),
        DriverState::ShuttingDown => "ShuttingDown".to_string(),
    }
}

impl ClimateDriver {
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.build_snapshot()
    }

    pub(super) fn build_snapshot(&self) -> DeviceSnapshot {
        let device = &self.device;
        DeviceSnapshot {
            timestamp: Utc::now(),
            id: device.id.clone(),
            name: device.name.clone(),
            model: Some(device.model),
            uart_id: device.uart_id.clone(),
            available: self.available,
            driver_state: driver_state_label(&self.state_tx.borrow()),
            uart_connected: self.transport.is_connected(),
            climate: device.climate.clone(),
            traits: Some(device.traits.clone()),
            selects: device.selects.clone(),
            switches: device.switches.clone(),
            current_temperature_sensor: device.current_temperature_sensor.clone(),
            awaiting_response: self.pending.is_some(),
            stats: self.stats.clone(),
        }
    }
}
