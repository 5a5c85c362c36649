use super::{ClimateDriver, DriverCommand, MAX_DEFERRED};
use crate::entities::ClimateCall;
use crate::error::{AcBridgeError, Result};
use std::time::Instant;

impl ClimateDriver {
    pub(crate) async fn handle_command(&mut self, cmd: DriverCommand) {
        let result = match cmd {
            DriverCommand::Control(call) => self.control(call).await,
            DriverCommand::SelectOption { entity_id, option } => {
                self.select_option(&entity_id, &option).await
            }
            DriverCommand::SetSwitch { entity_id, state } => {
                self.set_switch(&entity_id, state).await
            }
            DriverCommand::SensorValue { sensor_id, value } => {
                self.sensor_value(&sensor_id, value);
                Ok(())
            }
            DriverCommand::Shutdown => Ok(()),
        };
        if let Err(e) = result {
            self.logger.warn(&format!("Command failed: {}", e));
        }
    }

    /// Apply a climate call to the unit
    pub async fn control(&mut self, call: ClimateCall) -> Result<()> {
        let call = self.device.traits.validate(&call)?;
        if !self.state_known {
            self.defer(DriverCommand::Control(call));
            return Ok(());
        }
        let mut next = self.state.clone();
        if let Some(mode) = call.mode {
            next.mode = mode;
        }
        if let Some(t) = call.target_temperature {
            next.target_temperature = t;
        }
        if let Some(fan) = call.fan_mode {
            next.fan_mode = fan;
        }
        if next == self.state {
            self.logger.debug("Climate call matches current state, nothing to send");
            return Ok(());
        }
        self.logger.info(&format!(
            "Climate call: mode={:?} target={:?} fan={:?}",
            call.mode,
            call.target_temperature,
            call.fan_mode.map(|f| f.label())
        ));
        self.send_state(next, Instant::now()).await
    }

    /// Select an option on one of the device's select entities
    pub async fn select_option(&mut self, entity_id: &str, option: &str) -> Result<()> {
        let select = self
            .device
            .selects
            .iter()
            .find(|s| s.id == entity_id)
            .ok_or_else(|| AcBridgeError::not_found("select", entity_id))?;
        let raw = select.raw_for(option).ok_or_else(|| {
            AcBridgeError::validation(entity_id, format!("Invalid option '{}'", option))
        })?;
        let feature = select.feature;
        if !self.state_known {
            self.defer(DriverCommand::SelectOption {
                entity_id: entity_id.to_string(),
                option: option.to_string(),
            });
            return Ok(());
        }
        if select.state() == Some(option) && self.state.select_raw(feature) == Some(raw) {
            self.logger
                .debug(&format!("{} already at '{}', ignoring", entity_id, option));
            return Ok(());
        }

        let mut next = self.state.clone();
        next.set_select_raw(feature, raw);
        self.send_state(next, Instant::now()).await?;
        if let Some(select) = self.device.select_for_mut(feature) {
            select.publish_state(option);
        }
        Ok(())
    }

    /// Turn one of the device's switch entities on or off
    pub async fn set_switch(&mut self, entity_id: &str, state: bool) -> Result<()> {
        let switch = self
            .device
            .switches
            .iter()
            .find(|s| s.id == entity_id)
            .ok_or_else(|| AcBridgeError::not_found("switch", entity_id))?;
        let feature = switch.feature;
        if !self.state_known {
            self.defer(DriverCommand::SetSwitch {
                entity_id: entity_id.to_string(),
                state,
            });
            return Ok(());
        }
        if switch.state() == Some(state) && self.state.switch(feature) == Some(state) {
            self.logger.debug(&format!(
                "{} already {}, ignoring",
                entity_id,
                if state { "on" } else { "off" }
            ));
            return Ok(());
        }

        let mut next = self.state.clone();
        next.set_switch(feature, state);
        self.send_state(next, Instant::now()).await?;
        if let Some(switch) = self.device.switch_for_mut(feature) {
            switch.publish_state(state);
        }
        Ok(())
    }

    /// Hold a change until the first report; control frames carry the full
    /// unit state.
    fn defer(&mut self, cmd: DriverCommand) {
        if self.deferred.len() >= MAX_DEFERRED {
            let dropped = self.deferred.remove(0);
            self.logger
                .warn(&format!("Too many queued changes, dropping {:?}", dropped));
        }
        self.logger
            .info(&format!("Unit state unknown, queueing {:?}", cmd));
        self.deferred.push(cmd);
    }

    /// Send the changes queued before the first report
    pub(crate) async fn replay_deferred(&mut self) {
        if !self.state_known || self.deferred.is_empty() {
            return;
        }
        let queued = std::mem::take(&mut self.deferred);
        self.logger
            .info(&format!("Unit state known, applying {} queued changes", queued.len()));
        for cmd in queued {
            self.handle_command(cmd).await;
        }
        self.dirty = true;
    }

    /// Feed an external sensor reading; ignored unless it is this device's
    /// current temperature sensor.
    pub fn sensor_value(&mut self, sensor_id: &str, value: f32) {
        if self.device.current_temperature_sensor.as_deref() != Some(sensor_id) {
            return;
        }
        let climate = &mut self.device.climate;
        climate.current_temperature = Some(value);
        climate.refresh_action();
        self.dirty = true;
    }
}
