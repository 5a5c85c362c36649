#![cfg(test)]

use super::web::*;
use crate::bridge::Bridge;
use crate::components::build_components;
use crate::config::{ClimateConfig, Config, SensorConfig, UartConfig};
use crate::driver::{DriverSettings, MemoryUart, UartLike};
use crate::models::Model;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.uarts.push(UartConfig::default());
    config.sensors.push(SensorConfig {
        id: "room".to_string(),
        name: Some("Room".to_string()),
        unit_of_measurement: "°C".to_string(),
    });
    config.climates.push(ClimateConfig {
        id: "living".to_string(),
        platform: Model::GreeAc,
        name: None,
        uart_id: None,
        current_temperature_sensor: Some("room".to_string()),
        entities: Default::default(),
    });
    config
}

fn test_state() -> AppState {
    let config = test_config();
    let graph = build_components(&config).unwrap();
    let bridge = Bridge::from_graph(graph, DriverSettings::default(), |_| {
        let (uart, _unit) = MemoryUart::new();
        Ok(Box::new(uart) as Box<dyn UartLike>)
    })
    .unwrap();
    AppState {
        bridge: Arc::new(bridge),
        config: Arc::new(config),
    }
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = build_router(state)
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or_default())
}

async fn post_json(state: AppState, uri: &str, body: serde_json::Value) -> StatusCode {
    build_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn health_ok() {
    let router = axum::Router::new().route("/api/health", axum::routing::get(health));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn devices_listed_with_entities() {
    let (status, json) = get_json(test_state(), "/api/devices").await;
    assert_eq!(status, StatusCode::OK);
    let devices = json.as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["id"], "living");
    assert_eq!(devices[0]["name"], "Thermostat");
    assert_eq!(devices[0]["model"], "gree_ac");
    assert_eq!(devices[0]["selects"].as_array().unwrap().len(), 5);
    assert_eq!(devices[0]["switches"].as_array().unwrap().len(), 7);
    assert_eq!(devices[0]["current_temperature_sensor"], "room");
}

#[tokio::test]
async fn unknown_device_is_404() {
    let (status, json) = get_json(test_state(), "/api/devices/kitchen").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("kitchen"));
}

#[tokio::test]
async fn control_validation() {
    let state = test_state();
    let ok = post_json(
        state.clone(),
        "/api/devices/living/control",
        serde_json::json!({"mode": "cool", "target_temperature": 21}),
    )
    .await;
    assert_eq!(ok, StatusCode::OK);

    let out_of_range = post_json(
        state.clone(),
        "/api/devices/living/control",
        serde_json::json!({"target_temperature": 35}),
    )
    .await;
    assert_eq!(out_of_range, StatusCode::BAD_REQUEST);

    let empty = post_json(state, "/api/devices/living/control", serde_json::json!({})).await;
    assert_eq!(empty, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn select_and_switch_routes() {
    let state = test_state();
    let status = post_json(
        state.clone(),
        "/api/devices/living/select/living_quiet_select",
        serde_json::json!({"option": "Auto"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let status = post_json(
        state.clone(),
        "/api/devices/living/select/living_quiet_select",
        serde_json::json!({"option": "Loud"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = post_json(
        state.clone(),
        "/api/devices/living/switch/living_turbo_switch",
        serde_json::json!({"state": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let status = post_json(
        state,
        "/api/devices/living/switch/living_plasma_switch",
        serde_json::json!({"state": true}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sensor_value_reaches_device() {
    let state = test_state();
    let status = post_json(
        state.clone(),
        "/api/sensors/room",
        serde_json::json!({"value": 23.5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, sensors) = get_json(state.clone(), "/api/sensors").await;
    assert_eq!(sensors[0]["state"], 23.5);

    let mut rx = state.bridge.subscribe("living").unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            if rx.borrow_and_update().climate.current_temperature == Some(23.5) {
                break;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    let status = post_json(state, "/api/sensors/attic", serde_json::json!({"value": 1.0})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn config_and_schemas() {
    let state = test_state();
    let (status, json) = get_json(state.clone(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["climate"][0]["platform"], "gree_ac");

    let (status, json) = get_json(state.clone(), "/api/config/schema").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["properties"]["climate"].is_object());

    let (status, json) = get_json(state.clone(), "/api/schema/devices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["platforms"].as_array().unwrap().len(), 4);

    let (status, json) = get_json(state, "/api/components").await;
    assert_eq!(status, StatusCode::OK);
    let setters: Vec<&str> = json["attachments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["setter"].as_str().unwrap())
        .collect();
    assert!(setters.contains(&"set_uart_parent"));
    assert!(setters.contains(&"set_current_temperature_sensor"));
}

#[tokio::test]
async fn log_tail_with_tempfile() {
    let mut state = test_state();
    let tf = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tf.path(), "a\nb\nc\n").unwrap();
    let mut config = (*state.config).clone();
    config.logging.file = tf.path().to_string_lossy().to_string();
    state.config = Arc::new(config);

    let resp = build_router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/logs/tail?lines=2")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "b\nc");

    let resp = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/logs/download")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test]
async fn web_level_roundtrip() {
    let status = post_json(
        test_state(),
        "/api/logs/web_level?level=bogus",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get_json(test_state(), "/api/logs/web_level").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["level"].is_string());
}
