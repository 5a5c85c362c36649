//! Per-device climate driver
//!
//! One [`ClimateDriver`] runs per configured climate device. It owns the
//! device's entities, the protocol codec and the serial transport, and runs a
//! loop that polls the UART, turns frames into entity updates, executes
//! commands from the web API and republishes a [`DeviceSnapshot`] on change.

mod commands;
mod snapshot;
mod types;
mod uart_like;

#[cfg(test)]
mod tests;

pub use snapshot::DeviceSnapshot;
pub use types::{DriverCommand, DriverSettings, DriverState, DriverStats};
pub use uart_like::{MemoryUart, MemoryUartHandle, UartLike};

use crate::components::ClimateDevice;
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::protocol::{AcProtocol, AcState, FrameReceiver, UnitReport, protocol_for};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};
use types::PendingRequest;

const READ_CHUNK: usize = 256;

/// Changes held back while the unit state is still unknown
const MAX_DEFERRED: usize = 16;

pub struct ClimateDriver {
    device: ClimateDevice,
    protocol: Box<dyn AcProtocol>,
    receiver: FrameReceiver,
    transport: Box<dyn UartLike>,
    settings: DriverSettings,

    /// Best known unit state: reports merged with the changes we sent
    state: AcState,
    /// Set by the first unit report; until then `state` is only a default
    state_known: bool,
    deferred: Vec<DriverCommand>,
    pending: Option<PendingRequest>,
    available: bool,
    last_rx: Option<Instant>,
    stats: DriverStats,
    dirty: bool,

    state_tx: watch::Sender<DriverState>,
    snapshot_tx: watch::Sender<Arc<DeviceSnapshot>>,
    commands_tx: mpsc::UnboundedSender<DriverCommand>,
    commands_rx: mpsc::UnboundedReceiver<DriverCommand>,
    logger: StructuredLogger,
}

impl ClimateDriver {
    pub fn new(
        device: ClimateDevice,
        transport: Box<dyn UartLike>,
        settings: DriverSettings,
    ) -> Self {
        let protocol = protocol_for(device.model);
        let receiver = FrameReceiver::new(protocol.framing(), settings.read_timeout);
        let logger = get_logger_with_context(
            LogContext::new("driver")
                .with_device(&device.id)
                .with_port(transport.port_name()),
        );
        let (state_tx, _) = watch::channel(DriverState::Initializing);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let mut driver = Self {
            device,
            protocol,
            receiver,
            transport,
            settings,
            state: AcState::default(),
            state_known: false,
            deferred: Vec::new(),
            pending: None,
            available: false,
            last_rx: None,
            stats: DriverStats::default(),
            dirty: false,
            state_tx,
            snapshot_tx: watch::channel(Arc::new(DeviceSnapshot::default())).0,
            commands_tx,
            commands_rx,
            logger,
        };
        let initial = Arc::new(driver.build_snapshot());
        driver.snapshot_tx.send_replace(initial);
        driver
    }

    pub fn device(&self) -> &ClimateDevice {
        &self.device
    }

    pub fn unit_state(&self) -> &AcState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn awaiting_response(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a unit report has been received yet
    pub fn state_known(&self) -> bool {
        self.state_known
    }

    /// Changes waiting for the first unit report
    pub fn deferred_commands(&self) -> &[DriverCommand] {
        &self.deferred
    }

    pub fn commands_sender(&self) -> mpsc::UnboundedSender<DriverCommand> {
        self.commands_tx.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Main loop; returns after a `Shutdown` command
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Starting {} driver for '{}'",
            self.device.model, self.device.name
        ));
        self.set_driver_state(DriverState::Running);
        self.publish_if_dirty();

        let mut poll_interval = interval(self.settings.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let outcome = self.poll_at(Instant::now()).await;
                    self.on_poll_outcome(outcome);
                }
                cmd = self.commands_rx.recv() => {
                    match cmd {
                        Some(DriverCommand::Shutdown) | None => {
                            self.logger.info("Shutdown signal received");
                            break;
                        }
                        Some(cmd) => {
                            self.handle_command(cmd).await;
                            self.publish_if_dirty();
                        }
                    }
                }
            }
        }

        self.set_driver_state(DriverState::ShuttingDown);
        self.publish_if_dirty();
        Ok(())
    }

    /// One poll cycle at `now`: drain the UART, decode frames, then handle
    /// inter-byte timeouts, resends and link loss.
    pub async fn poll_at(&mut self, now: Instant) -> Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        let mut outcome = Ok(());
        loop {
            match self.transport.read_available(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    for frame in self.receiver.feed(&buf[..n], now) {
                        self.handle_frame(&frame, now);
                    }
                    if n < buf.len() {
                        break;
                    }
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.receiver.check_timeout(now);
        self.stats.receiver = self.receiver.stats();
        self.replay_deferred().await;
        self.check_pending(now).await;
        self.check_link(now);
        self.publish_if_dirty();
        outcome
    }

    fn on_poll_outcome(&mut self, outcome: Result<()>) {
        match outcome {
            Ok(()) => {
                if matches!(*self.state_tx.borrow(), DriverState::Error(_)) {
                    self.logger.info("Serial transport recovered");
                    self.set_driver_state(DriverState::Running);
                }
            }
            Err(e) => {
                let msg = e.to_string();
                let already = matches!(&*self.state_tx.borrow(), DriverState::Error(m) if *m == msg);
                if already {
                    self.logger.debug(&msg);
                } else {
                    self.logger.warn(&format!("Poll cycle failed: {}", msg));
                    self.set_driver_state(DriverState::Error(msg));
                }
            }
        }
        self.publish_if_dirty();
    }

    fn set_driver_state(&mut self, state: DriverState) {
        self.state_tx.send_replace(state);
        self.dirty = true;
    }

    fn handle_frame(&mut self, frame: &[u8], now: Instant) {
        self.stats.frames_received += 1;
        match self.protocol.decode(frame) {
            Ok(report) => {
                self.last_rx = Some(now);
                self.stats.last_rx_at = Some(Utc::now());
                if !self.available {
                    self.logger.info("Unit link established");
                    self.available = true;
                }
                if self.pending.take().is_some() {
                    self.logger.debug("Unit answered pending request");
                }
                if let Some(report) = report {
                    self.apply_report(&report);
                }
                self.dirty = true;
            }
            Err(e) => {
                self.stats.frames_rejected += 1;
                self.logger.warn(&format!(
                    "Dropping frame {}: {}",
                    crate::uart::format_hex_pretty(frame),
                    e
                ));
            }
        }
    }

    /// Merge a unit report into the device state and its entities
    fn apply_report(&mut self, report: &UnitReport) {
        self.state.apply(report);
        self.state_known = true;
        self.sync_climate_from_state();

        if !self.device.uses_external_sensor()
            && let Some(t) = report.current_temperature
        {
            self.device.climate.current_temperature = Some(t);
        }
        if let Some(t) = report.outdoor_temperature {
            self.device.climate.outdoor_temperature = Some(t);
        }
        self.device.climate.refresh_action();

        for &(feature, raw) in &report.selects {
            if let Some(select) = self.device.select_for_mut(feature) {
                select.update_from_raw(raw);
            }
        }
        for &(feature, on) in &report.switches {
            if let Some(switch) = self.device.switch_for_mut(feature) {
                switch.publish_state(on);
            }
        }
    }

    fn sync_climate_from_state(&mut self) {
        let climate = &mut self.device.climate;
        climate.mode = self.state.mode;
        climate.target_temperature = self.state.target_temperature;
        climate.fan_mode = Some(self.state.fan_mode);
        climate.refresh_action();
        self.dirty = true;
    }

    /// Encode and send `next` as the new unit state
    async fn send_state(&mut self, next: AcState, now: Instant) -> Result<()> {
        let frame = self.protocol.encode(&next)?;
        self.state = next;
        self.sync_climate_from_state();
        self.pending = Some(PendingRequest {
            frame: frame.clone(),
            sent_at: now,
            attempts: 1,
        });
        self.write(&frame).await
    }

    async fn write(&mut self, frame: &[u8]) -> Result<()> {
        self.transport.write_frame(frame).await?;
        self.stats.frames_sent += 1;
        self.stats.last_tx_at = Some(Utc::now());
        self.dirty = true;
        Ok(())
    }

    async fn check_pending(&mut self, now: Instant) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        if now.saturating_duration_since(pending.sent_at) < self.settings.response_timeout {
            return;
        }
        if pending.attempts >= self.settings.max_retries {
            self.logger.warn(&format!(
                "No response from unit after {} attempts, giving up",
                pending.attempts
            ));
            self.stats.failed_requests += 1;
            self.pending = None;
            self.dirty = true;
            return;
        }

        let frame = pending.frame.clone();
        let attempt = pending.attempts + 1;
        self.logger.debug(&format!(
            "Response timeout, resending (attempt {}/{})",
            attempt, self.settings.max_retries
        ));
        if let Some(p) = self.pending.as_mut() {
            p.attempts = attempt;
            p.sent_at = now;
        }
        self.stats.resends += 1;
        if let Err(e) = self.write(&frame).await {
            self.logger.warn(&format!("Resend failed: {}", e));
        }
    }

    fn check_link(&mut self, now: Instant) {
        if !self.available {
            return;
        }
        let silent = self
            .last_rx
            .is_none_or(|t| now.saturating_duration_since(t) > self.settings.link_timeout);
        if silent {
            self.logger.warn(&format!(
                "No valid frame for {:?}, marking unit unavailable",
                self.settings.link_timeout
            ));
            self.available = false;
            self.dirty = true;
        }
    }

    fn publish_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let snapshot = Arc::new(self.build_snapshot());
        self.snapshot_tx.send_replace(snapshot);
    }
}
