use crate::models::Feature;
use serde::Serialize;

/// Boolean entity attached to a climate device
#[derive(Debug, Clone, Serialize)]
pub struct SwitchEntity {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub feature: Feature,
    state: Option<bool>,
    #[serde(skip)]
    publish_count: u64,
}

impl SwitchEntity {
    pub fn new(id: String, name: String, icon: Option<String>, feature: Feature) -> Self {
        Self {
            id,
            name,
            icon,
            feature,
            state: None,
            publish_count: 0,
        }
    }

    pub fn state(&self) -> Option<bool> {
        self.state
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    /// Switches republish on every report, changed or not
    pub fn publish_state(&mut self, state: bool) {
        self.state = Some(state);
        self.publish_count += 1;
    }
}
