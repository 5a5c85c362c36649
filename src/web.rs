//! Axum-based HTTP API for the climate bridge

pub mod logs;

pub use logs::logs_stream;

use crate::bridge::Bridge;
use crate::config::Config;
use crate::driver::DeviceSnapshot;
use crate::entities::ClimateCall;
use crate::error::AcBridgeError;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub option: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchBody {
    pub state: bool,
}

#[derive(Debug, Deserialize)]
pub struct SensorBody {
    pub value: f32,
}

/// Map bridge errors onto HTTP status codes
pub fn error_response(err: AcBridgeError) -> Response {
    let status = match &err {
        AcBridgeError::NotFound { .. } => StatusCode::NOT_FOUND,
        AcBridgeError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

fn accepted(result: crate::error::Result<()>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"ok": true}))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots: Vec<DeviceSnapshot> = state
        .bridge
        .snapshots()
        .iter()
        .map(|s| s.as_ref().clone())
        .collect();
    Json(snapshots)
}

pub async fn get_device(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.bridge.snapshot(&id) {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn control_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(call): Json<ClimateCall>,
) -> Response {
    accepted(state.bridge.control(&id, call))
}

pub async fn select_option(
    State(state): State<AppState>,
    Path((id, entity)): Path<(String, String)>,
    Json(body): Json<SelectBody>,
) -> Response {
    accepted(state.bridge.select_option(&id, &entity, &body.option))
}

pub async fn set_switch(
    State(state): State<AppState>,
    Path((id, entity)): Path<(String, String)>,
    Json(body): Json<SwitchBody>,
) -> Response {
    accepted(state.bridge.set_switch(&id, &entity, body.state))
}

/// Device snapshots as server-sent events
pub async fn device_events(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let rx = match state.bridge.subscribe(&id) {
        Ok(rx) => rx,
        Err(e) => return error_response(e),
    };
    let stream = WatchStream::new(rx).filter_map(|snapshot| {
        serde_json::to_string(&*snapshot).ok().map(|payload| {
            Ok::<Event, std::convert::Infallible>(Event::default().event("snapshot").data(payload))
        })
    });
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

pub async fn list_sensors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.bridge.sensors().await)
}

pub async fn publish_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SensorBody>,
) -> Response {
    accepted(state.bridge.publish_sensor(&id, body.value).await)
}

pub async fn get_components(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "uarts": state.bridge.graph().uarts,
        "attachments": state.bridge.graph().attachments,
    }))
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(
        serde_json::to_value(state.config.as_ref())
            .unwrap_or(serde_json::json!({"error":"serialization"})),
    )
}

pub async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

pub async fn get_device_schema() -> impl IntoResponse {
    Json(crate::web_schema::build_device_schema())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/{id}", get(get_device))
        .route("/api/devices/{id}/control", post(control_device))
        .route("/api/devices/{id}/select/{entity}", post(select_option))
        .route("/api/devices/{id}/switch/{entity}", post(set_switch))
        .route("/api/devices/{id}/events", get(device_events))
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{id}", post(publish_sensor))
        .route("/api/components", get(get_components))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .route("/api/schema/devices", get(get_device_schema))
        .merge(logs::routes())
        .with_state(state)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(bridge: Arc<Bridge>, config: Arc<Config>) -> anyhow::Result<()> {
    let host = config.web.host.clone();
    let port = config.web.port;
    let router = build_router(AppState { bridge, config });

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{}",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
