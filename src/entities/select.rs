use crate::models::{Feature, SelectOption};
use serde::Serialize;

/// Discrete-choice entity attached to a climate device
#[derive(Debug, Clone, Serialize)]
pub struct SelectEntity {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub feature: Feature,
    #[serde(serialize_with = "serialize_labels")]
    options: &'static [SelectOption],
    state: Option<String>,
    #[serde(skip)]
    publish_count: u64,
}

fn serialize_labels<S: serde::Serializer>(
    options: &&'static [SelectOption],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(options.iter().map(|o| o.label))
}

impl SelectEntity {
    pub fn new(
        id: String,
        name: String,
        icon: Option<String>,
        feature: Feature,
        options: &'static [SelectOption],
    ) -> Self {
        Self {
            id,
            name,
            icon,
            feature,
            options,
            state: None,
            publish_count: 0,
        }
    }

    pub fn options(&self) -> &'static [SelectOption] {
        self.options
    }

    pub fn has_option(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|o| o.label == label)
    }

    pub fn at(&self, index: usize) -> Option<&'static str> {
        self.options.get(index).map(|o| o.label)
    }

    pub fn raw_for(&self, label: &str) -> Option<u8> {
        self.options.iter().find(|o| o.label == label).map(|o| o.raw)
    }

    pub fn label_for(&self, raw: u8) -> Option<&'static str> {
        self.options.iter().find(|o| o.raw == raw).map(|o| o.label)
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.as_deref().and_then(|s| self.index_of(s))
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    pub fn publish_state(&mut self, label: &str) {
        self.state = Some(label.to_string());
        self.publish_count += 1;
    }

    /// Publish the option matching a reported raw code, only when it differs
    /// from the current one. Returns true when a new state was published.
    pub fn update_from_raw(&mut self, raw: u8) -> bool {
        let Some(label) = self.label_for(raw) else {
            return false;
        };
        if self.state.as_deref() == Some(label) {
            return false;
        }
        self.publish_state(label);
        true
    }
}
