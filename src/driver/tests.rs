use super::*;
use crate::components::build_components;
use crate::config::{ClimateConfig, Config, SensorConfig, UartConfig};
use crate::entities::{ClimateAction, ClimateCall, ClimateMode, FanMode};
use crate::error::AcBridgeError;
use crate::models::Model;
use crate::protocol::cnt::{CMD_REPORT, PAYLOAD_LEN, build_frame};
use std::time::Duration;

fn settings() -> DriverSettings {
    DriverSettings {
        poll_interval: Duration::from_millis(10),
        read_timeout: Duration::from_millis(100),
        response_timeout: Duration::from_millis(500),
        max_retries: 2,
        link_timeout: Duration::from_secs(5),
        reconnect_delay: Duration::from_secs(1),
    }
}

fn device(model: Model, sensor: Option<&str>) -> ClimateDevice {
    let mut config = Config::default();
    config.uarts.push(UartConfig::default());
    if let Some(id) = sensor {
        config.sensors.push(SensorConfig {
            id: id.to_string(),
            name: None,
            unit_of_measurement: "°C".to_string(),
        });
    }
    config.climates.push(ClimateConfig {
        id: "ac".to_string(),
        platform: model,
        name: None,
        uart_id: None,
        current_temperature_sensor: sensor.map(str::to_string),
        entities: Default::default(),
    });
    build_components(&config).unwrap().devices.remove(0)
}

fn driver(model: Model, sensor: Option<&str>) -> (ClimateDriver, MemoryUartHandle) {
    let (uart, handle) = MemoryUart::new();
    let driver = ClimateDriver::new(device(model, sensor), Box::new(uart), settings());
    (driver, handle)
}

/// Cooling at 22 with 25 inside, quiet on, turbo on, vertical swing 9
fn cool_report() -> Vec<u8> {
    let mut p = [0u8; PAYLOAD_LEN];
    p[3] = 0x80 | (1 << 4);
    p[4] = 6 << 4;
    p[5] = 0x02 | 0x01;
    p[6] = 9 << 4;
    p[7] = 2 << 4;
    p[8] = (1 << 4) | 4;
    p[42] = 40 + 25;
    p[43] = 40 + 12;
    build_frame(CMD_REPORT, &p).unwrap()
}

#[tokio::test]
async fn test_report_updates_device() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    assert!(!drv.is_available());

    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();

    assert!(drv.is_available());
    let snap = drv.snapshot();
    assert_eq!(snap.climate.mode, ClimateMode::Cool);
    assert_eq!(snap.climate.target_temperature, 22.0);
    assert_eq!(snap.climate.current_temperature, Some(25.0));
    assert_eq!(snap.climate.outdoor_temperature, Some(12.0));
    assert_eq!(snap.climate.fan_mode, Some(FanMode::High));
    assert_eq!(snap.climate.action, ClimateAction::Cooling);

    let quiet = drv.device().select("ac_quiet_select").unwrap();
    assert_eq!(quiet.state(), Some("On"));
    let vswing = drv.device().select("ac_vertical_swing_select").unwrap();
    assert_eq!(vswing.state(), Some("Constant - Middle"));
    assert_eq!(drv.device().switch("ac_turbo_switch").unwrap().state(), Some(true));
    assert_eq!(drv.device().switch("ac_health_switch").unwrap().state(), Some(false));
    assert_eq!(drv.stats().frames_received, 1);
}

#[tokio::test]
async fn test_repeated_report_publishes_switches_only() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();
    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();

    let quiet = drv.device().select("ac_quiet_select").unwrap();
    assert_eq!(quiet.publish_count(), 1);
    let turbo = drv.device().switch("ac_turbo_switch").unwrap();
    assert_eq!(turbo.publish_count(), 2);
}

#[tokio::test]
async fn test_external_sensor_overrides_reported_temperature() {
    let (mut drv, unit) = driver(Model::GreeAc, Some("room"));
    drv.sensor_value("room", 21.5);
    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();
    assert_eq!(drv.snapshot().climate.current_temperature, Some(21.5));

    drv.sensor_value("other", 30.0);
    assert_eq!(drv.snapshot().climate.current_temperature, Some(21.5));
}

async fn reported(model: Model) -> (ClimateDriver, MemoryUartHandle) {
    let (mut drv, unit) = driver(model, None);
    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();
    assert!(drv.state_known());
    (drv, unit)
}

#[tokio::test]
async fn test_select_option_sends_frame_once() {
    let (mut drv, unit) = reported(Model::GreeAc).await;
    drv.select_option("ac_quiet_select", "Auto").await.unwrap();

    let sent = unit.sent_frames();
    assert_eq!(sent.len(), 1);
    // P8 sits after the 4 header bytes
    assert_eq!((sent[0][4 + 8] & 0x30) >> 4, 2);
    assert_eq!(
        drv.device().select("ac_quiet_select").unwrap().state(),
        Some("Auto")
    );
    assert!(drv.awaiting_response());

    drv.select_option("ac_quiet_select", "Auto").await.unwrap();
    assert_eq!(unit.sent_frames().len(), 1);
}

#[tokio::test]
async fn test_invalid_targets_rejected() {
    let (mut drv, unit) = driver(Model::SinclairAc, None);
    let err = drv.select_option("ac_vertical_swing_select", "nope").await.unwrap_err();
    assert!(matches!(err, AcBridgeError::Validation { .. }));
    let err = drv.set_switch("ac_turbo_switch", true).await.unwrap_err();
    assert!(matches!(err, AcBridgeError::NotFound { .. }));
    assert!(unit.sent_frames().is_empty());
}

#[tokio::test]
async fn test_switch_and_control() {
    let (mut drv, unit) = reported(Model::SinclairAc).await;
    drv.set_switch("ac_save_switch", true).await.unwrap();
    assert!(drv.unit_state().powersave);
    assert_eq!(drv.device().switch("ac_save_switch").unwrap().state(), Some(true));

    let call = ClimateCall {
        mode: Some(ClimateMode::Heat),
        target_temperature: Some(20.6),
        ..Default::default()
    };
    drv.control(call.clone()).await.unwrap();
    assert_eq!(drv.unit_state().mode, ClimateMode::Heat);
    assert_eq!(drv.unit_state().target_temperature, 21.0);
    assert_eq!(unit.sent_frames().len(), 2);

    // unchanged call is not sent again
    drv.control(call).await.unwrap();
    assert_eq!(unit.sent_frames().len(), 2);
}

#[tokio::test]
async fn test_resend_then_give_up() {
    let (mut drv, unit) = reported(Model::GreeAc).await;
    drv.set_switch("ac_light_switch", false).await.unwrap();

    let t1 = Instant::now() + Duration::from_millis(600);
    drv.poll_at(t1).await.unwrap();
    assert_eq!(unit.sent_frames().len(), 2);
    assert_eq!(drv.stats().resends, 1);
    assert!(drv.awaiting_response());

    drv.poll_at(t1 + Duration::from_millis(600)).await.unwrap();
    assert!(!drv.awaiting_response());
    assert_eq!(drv.stats().failed_requests, 1);
    assert_eq!(unit.sent_frames().len(), 2);
}

#[tokio::test]
async fn test_response_clears_pending() {
    let (mut drv, unit) = reported(Model::GreeAc).await;
    drv.set_switch("ac_light_switch", false).await.unwrap();
    assert!(drv.awaiting_response());
    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();
    assert!(!drv.awaiting_response());
}

#[tokio::test]
async fn test_changes_wait_for_first_report() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    drv.set_switch("ac_light_switch", false).await.unwrap();
    drv.select_option("ac_quiet_select", "Auto").await.unwrap();
    drv.poll_at(Instant::now()).await.unwrap();

    // nothing may reach a unit whose power state is unknown
    assert!(unit.sent_frames().is_empty());
    assert_eq!(drv.deferred_commands().len(), 2);
    assert_eq!(drv.device().switch("ac_light_switch").unwrap().state(), None);

    unit.push_rx(&cool_report());
    drv.poll_at(Instant::now()).await.unwrap();

    assert!(drv.deferred_commands().is_empty());
    let sent = unit.sent_frames();
    assert_eq!(sent.len(), 2);
    let last = sent.last().unwrap();
    // P3 keeps power on in cool mode, P5 light bit cleared, P8 quiet auto
    assert_eq!(last[4 + 3] & 0xF0, 0x80 | (1 << 4));
    assert_eq!(last[4 + 5] & 0x02, 0);
    assert_eq!((last[4 + 8] & 0x30) >> 4, 2);
    assert_eq!(drv.device().switch("ac_light_switch").unwrap().state(), Some(false));
    assert_eq!(drv.snapshot().climate.mode, ClimateMode::Cool);
}

#[tokio::test]
async fn test_invalid_change_not_queued() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    assert!(drv.select_option("ac_quiet_select", "Loud").await.is_err());
    assert!(drv.set_switch("ac_nope", true).await.is_err());
    assert!(drv.deferred_commands().is_empty());
    assert!(unit.sent_frames().is_empty());
}

#[tokio::test]
async fn test_link_timeout_marks_unavailable() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    let t0 = Instant::now();
    unit.push_rx(&cool_report());
    drv.poll_at(t0).await.unwrap();
    assert!(drv.is_available());

    drv.poll_at(t0 + Duration::from_secs(6)).await.unwrap();
    assert!(!drv.is_available());
    assert!(!drv.subscribe_snapshot().borrow().available);
}

#[tokio::test]
async fn test_rejected_frame_counted() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    let mut frame = cool_report();
    let last = frame.len() - 1;
    frame[last] ^= 0x55;
    unit.push_rx(&frame);
    drv.poll_at(Instant::now()).await.unwrap();
    assert_eq!(drv.stats().frames_rejected, 1);
    assert!(!drv.is_available());
}

#[tokio::test]
async fn test_run_until_shutdown() {
    let (mut drv, unit) = driver(Model::GreeAc, None);
    let commands = drv.commands_sender();
    let mut snapshots = drv.subscribe_snapshot();
    let task = tokio::spawn(async move {
        drv.run().await.unwrap();
        drv
    });

    unit.push_rx(&cool_report());
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            snapshots.changed().await.unwrap();
            if snapshots.borrow().available {
                break;
            }
        }
    })
    .await
    .unwrap();

    commands
        .send(DriverCommand::SetSwitch {
            entity_id: "ac_sleep_switch".to_string(),
            state: true,
        })
        .unwrap();
    commands.send(DriverCommand::Shutdown).unwrap();

    let drv = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert!(drv.unit_state().sleep);
    assert_eq!(*drv.subscribe_state().borrow(), DriverState::ShuttingDown);
}
