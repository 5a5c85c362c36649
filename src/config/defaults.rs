use super::*;

pub(super) fn baud_rate() -> u32 {
    4800
}

pub(super) fn data_bits() -> u8 {
    8
}

pub(super) fn parity() -> String {
    "even".to_string()
}

pub(super) fn stop_bits() -> u8 {
    1
}

pub(super) fn temperature_unit() -> String {
    "°C".to_string()
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            id: "uart_bus".to_string(),
            port: "/dev/ttyS1".to_string(),
            baud_rate: baud_rate(),
            data_bits: data_bits(),
            parity: parity(),
            stop_bits: stop_bits(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            read_timeout_ms: 100,
            response_timeout_ms: 1500,
            max_retries: 3,
            link_timeout_ms: 30_000,
            reconnect_delay_ms: 5_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/acbridge.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
            web_level: None,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uarts: Vec::new(),
            sensors: Vec::new(),
            climates: Vec::new(),
            driver: DriverConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}
