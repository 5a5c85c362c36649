//! Component graph construction
//!
//! Turns the declarations of a [`Config`] into the immutable ownership graph
//! the runtime works on: every climate device gets one select or switch
//! entity per feature of its model, is attached to its UART and optionally
//! to an external temperature sensor. Every attachment is recorded with the
//! setter it went through so the wiring can be inspected.

use crate::config::{Config, UartConfig};
use crate::entities::{ClimateState, ClimateTraits, SelectEntity, SensorEntity, SwitchEntity};
use crate::error::{AcBridgeError, Result};
use crate::logging::get_logger;
use crate::models::{Feature, FeatureKind, Model};
use crate::protocol::{AcState, protocol_for};
use serde::Serialize;
use std::collections::HashSet;

/// A climate device with its child entities
#[derive(Debug, Clone, Serialize)]
pub struct ClimateDevice {
    pub id: String,
    pub name: String,
    pub model: Model,
    pub uart_id: Option<String>,
    pub current_temperature_sensor: Option<String>,
    pub traits: ClimateTraits,
    pub climate: ClimateState,
    pub selects: Vec<SelectEntity>,
    pub switches: Vec<SwitchEntity>,
}

impl ClimateDevice {
    pub fn new(id: String, name: String, model: Model) -> Self {
        let initial = AcState::default();
        Self {
            id,
            name,
            model,
            uart_id: None,
            current_temperature_sensor: None,
            traits: protocol_for(model).traits(),
            climate: ClimateState {
                mode: initial.mode,
                target_temperature: initial.target_temperature,
                ..ClimateState::default()
            },
            selects: Vec::new(),
            switches: Vec::new(),
        }
    }

    pub fn set_uart_parent(&mut self, uart_id: &str) {
        self.uart_id = Some(uart_id.to_string());
    }

    pub fn set_current_temperature_sensor(&mut self, sensor_id: &str) {
        self.current_temperature_sensor = Some(sensor_id.to_string());
    }

    pub fn attach_select(&mut self, select: SelectEntity) {
        self.selects.retain(|s| s.feature != select.feature);
        self.selects.push(select);
    }

    pub fn attach_switch(&mut self, switch: SwitchEntity) {
        self.switches.retain(|s| s.feature != switch.feature);
        self.switches.push(switch);
    }

    pub fn select(&self, entity_id: &str) -> Option<&SelectEntity> {
        self.selects.iter().find(|s| s.id == entity_id)
    }

    pub fn switch(&self, entity_id: &str) -> Option<&SwitchEntity> {
        self.switches.iter().find(|s| s.id == entity_id)
    }

    pub fn select_for_mut(&mut self, feature: Feature) -> Option<&mut SelectEntity> {
        self.selects.iter_mut().find(|s| s.feature == feature)
    }

    pub fn switch_for_mut(&mut self, feature: Feature) -> Option<&mut SwitchEntity> {
        self.switches.iter_mut().find(|s| s.feature == feature)
    }

    /// Unit-reported indoor temperature is ignored while a sensor is attached
    pub fn uses_external_sensor(&self) -> bool {
        self.current_temperature_sensor.is_some()
    }
}

/// One parent/child link created while wiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub parent: String,
    pub child: String,
    pub setter: &'static str,
}

/// Immutable result of wiring a configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentGraph {
    pub uarts: Vec<UartConfig>,
    pub sensors: Vec<SensorEntity>,
    pub devices: Vec<ClimateDevice>,
    pub attachments: Vec<Attachment>,
}

impl ComponentGraph {
    pub fn device(&self, id: &str) -> Option<&ClimateDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn sensor(&self, id: &str) -> Option<&SensorEntity> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn uart(&self, id: &str) -> Option<&UartConfig> {
        self.uarts.iter().find(|u| u.id == id)
    }

    /// Devices that take their current temperature from `sensor_id`
    pub fn devices_using_sensor<'a>(
        &'a self,
        sensor_id: &'a str,
    ) -> impl Iterator<Item = &'a ClimateDevice> + 'a {
        self.devices
            .iter()
            .filter(move |d| d.current_temperature_sensor.as_deref() == Some(sensor_id))
    }

    pub fn attachments_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Attachment> + 'a {
        self.attachments.iter().filter(move |a| a.parent == parent)
    }
}

#[derive(Default)]
struct IdRegistry {
    seen: HashSet<String>,
}

impl IdRegistry {
    fn claim(&mut self, id: &str, field: &str) -> Result<()> {
        if !self.seen.insert(id.to_string()) {
            return Err(AcBridgeError::validation(
                field,
                format!("ID '{}' redefined", id),
            ));
        }
        Ok(())
    }
}

/// Wire the declared components together
pub fn build_components(config: &Config) -> Result<ComponentGraph> {
    let logger = get_logger("components");
    let mut ids = IdRegistry::default();
    let mut graph = ComponentGraph::default();

    for (i, uart) in config.uarts.iter().enumerate() {
        ids.claim(&uart.id, &format!("uart[{i}].id"))?;
        graph.uarts.push(uart.clone());
    }

    for (i, sensor) in config.sensors.iter().enumerate() {
        ids.claim(&sensor.id, &format!("sensor[{i}].id"))?;
        graph.sensors.push(SensorEntity::new(
            sensor.id.clone(),
            sensor.name.clone().unwrap_or_else(|| sensor.id.clone()),
            sensor.unit_of_measurement.clone(),
        ));
    }

    let mut used_uarts: HashSet<String> = HashSet::new();

    for (i, climate) in config.climates.iter().enumerate() {
        let field = |name: &str| format!("climate[{i}].{name}");
        ids.claim(&climate.id, &field("id"))?;

        let model = climate.platform;
        let name = climate
            .name
            .clone()
            .unwrap_or_else(|| model.default_name().to_string());
        let mut device = ClimateDevice::new(climate.id.clone(), name, model);

        let uart_id = match (&climate.uart_id, graph.uarts.as_slice()) {
            (Some(id), _) => {
                if graph.uart(id).is_none() {
                    return Err(AcBridgeError::validation(
                        field("uart_id"),
                        format!("Couldn't find ID '{}'", id),
                    ));
                }
                id.clone()
            }
            (None, [only]) => only.id.clone(),
            (None, []) => {
                return Err(AcBridgeError::validation(
                    field("uart_id"),
                    "No UART declared",
                ));
            }
            (None, _) => {
                return Err(AcBridgeError::validation(
                    field("uart_id"),
                    "Several UARTs declared, uart_id is required",
                ));
            }
        };
        if !used_uarts.insert(uart_id.clone()) {
            return Err(AcBridgeError::validation(
                field("uart_id"),
                format!("UART '{}' is already used by another device", uart_id),
            ));
        }
        device.set_uart_parent(&uart_id);
        graph.attachments.push(Attachment {
            parent: device.id.clone(),
            child: uart_id,
            setter: "set_uart_parent",
        });

        for key in climate.entities.keys() {
            if model.feature_by_key(key).is_none() {
                return Err(AcBridgeError::validation(
                    field(&format!("entities.{key}")),
                    format!("'{}' is not a valid option for platform {}", key, model),
                ));
            }
        }

        for spec in model.features() {
            let overrides = climate.entities.get(spec.conf_key);
            let entity_id = overrides
                .and_then(|o| o.id.clone())
                .unwrap_or_else(|| format!("{}_{}", climate.id, spec.conf_key));
            ids.claim(&entity_id, &field(spec.conf_key))?;

            let entity_name = overrides
                .and_then(|o| o.name.clone())
                .unwrap_or_else(|| spec.name.to_string());
            let icon = overrides
                .and_then(|o| o.icon.clone())
                .or_else(|| spec.icon.map(str::to_string));

            match spec.kind {
                FeatureKind::Select(options) => device.attach_select(SelectEntity::new(
                    entity_id.clone(),
                    entity_name,
                    icon,
                    spec.feature,
                    options,
                )),
                FeatureKind::Switch => device.attach_switch(SwitchEntity::new(
                    entity_id.clone(),
                    entity_name,
                    icon,
                    spec.feature,
                )),
            }
            graph.attachments.push(Attachment {
                parent: device.id.clone(),
                child: entity_id,
                setter: spec.setter,
            });
        }

        if let Some(sensor_id) = &climate.current_temperature_sensor {
            if graph.sensor(sensor_id).is_none() {
                return Err(AcBridgeError::validation(
                    field("current_temperature_sensor"),
                    format!("Couldn't find ID '{}'", sensor_id),
                ));
            }
            device.set_current_temperature_sensor(sensor_id);
            graph.attachments.push(Attachment {
                parent: device.id.clone(),
                child: sensor_id.clone(),
                setter: "set_current_temperature_sensor",
            });
        }

        logger.info(&format!(
            "Wired {} '{}' with {} selects and {} switches",
            model,
            device.id,
            device.selects.len(),
            device.switches.len()
        ));
        graph.devices.push(device);
    }

    Ok(graph)
}
