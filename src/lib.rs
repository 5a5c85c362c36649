//! # acbridge - UART bridge for Gree and Sinclair air conditioners
//!
//! Talks the serial protocols of Gree and Sinclair split units and exposes
//! each unit as a climate device with its feature entities over a small
//! HTTP API.
//!
//! ## Architecture
//!
//! - `config`: YAML declaration of UARTs, sensors and climate devices
//! - `models`: supported platforms and the entities each one owns
//! - `components`: wiring of the declarations into a validated graph
//! - `entities`: climate, select, switch and sensor entities
//! - `protocol`: frame assembly and the per-platform codecs
//! - `uart`: serial transport
//! - `driver`: per-device runtime loop
//! - `bridge`: owner of all drivers and request routing
//! - `web`: HTTP server and REST API
//! - `logging`: structured logging and tracing

pub mod bridge;
pub mod components;
pub mod config;
pub mod driver;
pub mod entities;
pub mod error;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod uart;
pub mod web;
pub mod web_schema;

mod web_tests;

// Re-export commonly used types
pub use bridge::Bridge;
pub use config::Config;
pub use error::{AcBridgeError, Result};
