//! Runtime owner of all climate drivers
//!
//! [`Bridge`] wires the configuration, spawns one [`ClimateDriver`] task per
//! climate device and routes requests from the web API to the right driver.
//! Requests are validated against the component graph before they reach a
//! driver so callers get `NotFound`/`Validation` errors synchronously.

use crate::components::{ClimateDevice, ComponentGraph, build_components};
use crate::config::Config;
use crate::driver::{ClimateDriver, DeviceSnapshot, DriverCommand, DriverSettings, UartLike};
use crate::entities::{ClimateCall, SensorEntity};
use crate::error::{AcBridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::uart::UartConnectionManager;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct DeviceHandle {
    commands: mpsc::UnboundedSender<DriverCommand>,
    snapshot_rx: watch::Receiver<Arc<DeviceSnapshot>>,
}

pub struct Bridge {
    graph: Arc<ComponentGraph>,
    devices: BTreeMap<String, DeviceHandle>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    sensors: RwLock<BTreeMap<String, SensorEntity>>,
    logger: StructuredLogger,
}

impl Bridge {
    /// Wire `config` and start a driver on each device's serial port
    pub fn start(config: &Config) -> Result<Self> {
        let graph = build_components(config)?;
        let settings = DriverSettings::from(&config.driver);
        let uarts = graph.uarts.clone();
        Self::from_graph(graph, settings, |device| {
            let uart_id = device
                .uart_id
                .as_deref()
                .ok_or_else(|| AcBridgeError::config(format!("{} has no UART", device.id)))?;
            let uart = uarts
                .iter()
                .find(|u| u.id == uart_id)
                .ok_or_else(|| AcBridgeError::not_found("uart", uart_id))?;
            let manager =
                UartConnectionManager::new(uart, settings.poll_interval, settings.reconnect_delay)?;
            Ok(Box::new(manager) as Box<dyn UartLike>)
        })
    }

    /// Start drivers for an already wired graph using `transport_for` to
    /// create each device's transport.
    pub fn from_graph<F>(graph: ComponentGraph, settings: DriverSettings, mut transport_for: F) -> Result<Self>
    where
        F: FnMut(&ClimateDevice) -> Result<Box<dyn UartLike>>,
    {
        let logger = get_logger("bridge");
        let sensors = graph
            .sensors
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect();

        // All transports first so a failure leaves nothing running
        let drivers = graph
            .devices
            .iter()
            .map(|device| {
                let transport = transport_for(device)?;
                Ok(ClimateDriver::new(device.clone(), transport, settings))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut devices = BTreeMap::new();
        let mut tasks = Vec::new();
        for mut driver in drivers {
            let id = driver.device().id.clone();
            devices.insert(
                id.clone(),
                DeviceHandle {
                    commands: driver.commands_sender(),
                    snapshot_rx: driver.subscribe_snapshot(),
                },
            );
            let task_logger = logger.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = driver.run().await {
                    task_logger.error(&format!("Driver '{}' stopped: {}", id, e));
                }
            }));
        }
        logger.info(&format!("Started {} climate driver(s)", devices.len()));

        Ok(Self {
            graph: Arc::new(graph),
            devices,
            tasks: Mutex::new(tasks),
            sensors: RwLock::new(sensors),
            logger,
        })
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    pub fn snapshots(&self) -> Vec<Arc<DeviceSnapshot>> {
        self.devices
            .values()
            .map(|h| h.snapshot_rx.borrow().clone())
            .collect()
    }

    pub fn snapshot(&self, device_id: &str) -> Result<Arc<DeviceSnapshot>> {
        Ok(self.handle(device_id)?.snapshot_rx.borrow().clone())
    }

    /// Watch a device's snapshots
    pub fn subscribe(&self, device_id: &str) -> Result<watch::Receiver<Arc<DeviceSnapshot>>> {
        Ok(self.handle(device_id)?.snapshot_rx.clone())
    }

    fn handle(&self, device_id: &str) -> Result<&DeviceHandle> {
        self.devices
            .get(device_id)
            .ok_or_else(|| AcBridgeError::not_found("device", device_id))
    }

    fn device(&self, device_id: &str) -> Result<&ClimateDevice> {
        self.graph
            .device(device_id)
            .ok_or_else(|| AcBridgeError::not_found("device", device_id))
    }

    fn send(&self, device_id: &str, cmd: DriverCommand) -> Result<()> {
        self.handle(device_id)?
            .commands
            .send(cmd)
            .map_err(|_| AcBridgeError::generic(format!("Driver for '{}' is not running", device_id)))
    }

    pub fn control(&self, device_id: &str, call: ClimateCall) -> Result<()> {
        let device = self.device(device_id)?;
        if call.is_empty() {
            return Err(AcBridgeError::validation("call", "Empty climate call"));
        }
        let call = device.traits.validate(&call)?;
        self.send(device_id, DriverCommand::Control(call))
    }

    pub fn select_option(&self, device_id: &str, entity_id: &str, option: &str) -> Result<()> {
        let select = self
            .device(device_id)?
            .select(entity_id)
            .ok_or_else(|| AcBridgeError::not_found("select", entity_id))?;
        if !select.has_option(option) {
            return Err(AcBridgeError::validation(
                entity_id,
                format!("Invalid option '{}'", option),
            ));
        }
        self.send(
            device_id,
            DriverCommand::SelectOption {
                entity_id: entity_id.to_string(),
                option: option.to_string(),
            },
        )
    }

    pub fn set_switch(&self, device_id: &str, entity_id: &str, state: bool) -> Result<()> {
        self.device(device_id)?
            .switch(entity_id)
            .ok_or_else(|| AcBridgeError::not_found("switch", entity_id))?;
        self.send(
            device_id,
            DriverCommand::SetSwitch {
                entity_id: entity_id.to_string(),
                state,
            },
        )
    }

    /// Record a sensor reading and forward it to every device using it
    pub async fn publish_sensor(&self, sensor_id: &str, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(AcBridgeError::validation(sensor_id, "Value must be finite"));
        }
        {
            let mut sensors = self.sensors.write().await;
            let sensor = sensors
                .get_mut(sensor_id)
                .ok_or_else(|| AcBridgeError::not_found("sensor", sensor_id))?;
            sensor.publish_state(value);
        }
        for device in self.graph.devices_using_sensor(sensor_id) {
            self.send(
                &device.id,
                DriverCommand::SensorValue {
                    sensor_id: sensor_id.to_string(),
                    value,
                },
            )?;
        }
        Ok(())
    }

    pub async fn sensors(&self) -> Vec<SensorEntity> {
        self.sensors.read().await.values().cloned().collect()
    }

    /// Stop every driver and wait for the tasks to finish
    pub async fn shutdown(&self) {
        for handle in self.devices.values() {
            let _ = handle.commands.send(DriverCommand::Shutdown);
        }
        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.logger.warn(&format!("Driver task failed: {}", e)),
                Err(_) => self.logger.warn("Driver task did not stop in time"),
            }
        }
        self.logger.info("All climate drivers stopped");
    }
}
