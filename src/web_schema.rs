//! Device capability schema for UI clients
//!
//! Lists every supported platform with its climate traits and the select and
//! switch entities a device of that platform gets, including the
//! configuration key used to override each entity.

use crate::models::{FeatureKind, Model};
use crate::protocol::protocol_for;
use serde_json::{Value, json};

/// Build the per-platform device schema
pub fn build_device_schema() -> Value {
    let platforms: Vec<Value> = Model::ALL.iter().map(|&m| platform_schema(m)).collect();
    json!({ "platforms": platforms })
}

fn platform_schema(model: Model) -> Value {
    let traits = protocol_for(model).traits();
    let entities: Vec<Value> = model
        .features()
        .iter()
        .map(|spec| {
            let (kind, options) = match spec.kind {
                FeatureKind::Select(options) => (
                    "select",
                    options.iter().map(|o| o.label).collect::<Vec<_>>(),
                ),
                FeatureKind::Switch => ("switch", Vec::new()),
            };
            json!({
                "conf_key": spec.conf_key,
                "name": spec.name,
                "kind": kind,
                "setter": spec.setter,
                "icon": spec.icon,
                "options": options,
            })
        })
        .collect();

    json!({
        "platform": model.as_str(),
        "default_name": model.default_name(),
        "traits": traits,
        "entities": entities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_platforms_listed() {
        let schema = build_device_schema();
        let platforms = schema["platforms"].as_array().unwrap();
        assert_eq!(platforms.len(), 4);
        let names: Vec<&str> = platforms
            .iter()
            .map(|p| p["platform"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["gree_ac", "sinclair_ac", "sinclair_asc18", "sinclair_c"]);
    }

    #[test]
    fn test_asc18_has_no_entities() {
        let schema = build_device_schema();
        let asc18 = &schema["platforms"][2];
        assert!(asc18["entities"].as_array().unwrap().is_empty());
        assert_eq!(asc18["traits"]["supports_current_temperature"], false);
    }
}
