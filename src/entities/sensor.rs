use chrono::{DateTime, Utc};
use serde::Serialize;

/// Externally fed numeric sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorEntity {
    pub id: String,
    pub name: String,
    pub unit_of_measurement: String,
    state: Option<f32>,
    last_update: Option<DateTime<Utc>>,
}

impl SensorEntity {
    pub fn new(id: String, name: String, unit_of_measurement: String) -> Self {
        Self {
            id,
            name,
            unit_of_measurement,
            state: None,
            last_update: None,
        }
    }

    pub fn state(&self) -> Option<f32> {
        self.state
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn publish_state(&mut self, value: f32) {
        self.state = Some(value);
        self.last_update = Some(Utc::now());
    }
}
