//! Serial transport for the air-conditioner UART
//!
//! [`UartPort`] wraps a `tokio-serial` stream with read and write timeouts;
//! [`UartConnectionManager`] adds lazy opening and throttled reopening after
//! failures so a driver can keep polling while the adapter is unplugged.

use crate::config::UartConfig;
use crate::driver::UartLike;
use crate::error::{AcBridgeError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use std::fmt::Write as _;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// Serial line settings resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl LineSettings {
    pub fn from_config(config: &UartConfig) -> Result<Self> {
        let data_bits = match config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => {
                return Err(AcBridgeError::validation(
                    "data_bits",
                    format!("Unsupported data bits {}", other),
                ));
            }
        };
        let parity = match config.parity.to_ascii_lowercase().as_str() {
            "none" => Parity::None,
            "even" => Parity::Even,
            "odd" => Parity::Odd,
            other => {
                return Err(AcBridgeError::validation(
                    "parity",
                    format!("Unsupported parity {}", other),
                ));
            }
        };
        let stop_bits = match config.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => {
                return Err(AcBridgeError::validation(
                    "stop_bits",
                    format!("Unsupported stop bits {}", other),
                ));
            }
        };
        Ok(Self {
            baud_rate: config.baud_rate,
            data_bits,
            parity,
            stop_bits,
        })
    }
}

/// One serial port
pub struct UartPort {
    stream: Option<SerialStream>,
    config: UartConfig,
    settings: LineSettings,
    /// How long a read waits for the first byte
    read_wait: Duration,
    write_timeout: Duration,
    logger: StructuredLogger,
}

impl UartPort {
    pub fn new(config: &UartConfig, read_wait: Duration) -> Result<Self> {
        let settings = LineSettings::from_config(config)?;
        let logger = get_logger_with_context(
            LogContext::new("uart")
                .with_port(&config.port)
                .with_field("uart_id", config.id.clone()),
        );
        Ok(Self {
            stream: None,
            config: config.clone(),
            settings,
            read_wait,
            write_timeout: Duration::from_secs(1),
            logger,
        })
    }

    pub fn port(&self) -> &str {
        &self.config.port
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn open(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Opening {} at {} baud ({:?}, {:?}, {:?})",
            self.config.port,
            self.settings.baud_rate,
            self.settings.data_bits,
            self.settings.parity,
            self.settings.stop_bits
        ));
        let stream = tokio_serial::new(&self.config.port, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .parity(self.settings.parity)
            .stop_bits(self.settings.stop_bits)
            .open_native_async()
            .map_err(|e| {
                let msg = format!("Failed to open {}: {}", self.config.port, e);
                self.logger.error(&msg);
                AcBridgeError::uart(msg)
            })?;
        self.stream = Some(stream);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            self.logger.info("Serial port closed");
        }
    }

    /// Read whatever is pending. Returns 0 when nothing arrived in time.
    pub async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let wait = self.read_wait;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| AcBridgeError::uart("Serial port not open"))?;
        match timeout(wait, stream.read(buf)).await {
            Ok(Ok(0)) => Err(AcBridgeError::uart("Serial port closed by peer")),
            Ok(Ok(n)) => {
                self.logger
                    .trace(&format!("RX: {}", format_hex_pretty(&buf[..n])));
                Ok(n)
            }
            Ok(Err(e)) => {
                let msg = format!("Read failed: {}", e);
                self.logger.error(&msg);
                Err(AcBridgeError::uart(msg))
            }
            Err(_) => Ok(0),
        }
    }

    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let write_timeout = self.write_timeout;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| AcBridgeError::uart("Serial port not open"))?;
        let write = async {
            stream.write_all(frame).await?;
            stream.flush().await
        };
        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {
                self.logger
                    .trace(&format!("TX: {}", format_hex_pretty(frame)));
                Ok(())
            }
            Ok(Err(e)) => {
                let msg = format!("Write failed: {}", e);
                self.logger.error(&msg);
                Err(AcBridgeError::uart(msg))
            }
            Err(_) => {
                let msg = "Write timeout".to_string();
                self.logger.error(&msg);
                Err(AcBridgeError::timeout(msg))
            }
        }
    }
}

/// Opens the port on demand and reopens it after connection errors
pub struct UartConnectionManager {
    port: UartPort,
    reconnect_delay: Duration,
    last_attempt: Option<Instant>,
    failures: u32,
}

impl UartConnectionManager {
    pub fn new(config: &UartConfig, read_wait: Duration, reconnect_delay: Duration) -> Result<Self> {
        Ok(Self {
            port: UartPort::new(config, read_wait)?,
            reconnect_delay,
            last_attempt: None,
            failures: 0,
        })
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.port.is_open() {
            return Ok(());
        }
        if let Some(last) = self.last_attempt
            && last.elapsed() < self.reconnect_delay
        {
            return Err(AcBridgeError::uart("Serial port unavailable, waiting to reopen"));
        }
        self.last_attempt = Some(Instant::now());
        match self.port.open() {
            Ok(()) => {
                self.failures = 0;
                Ok(())
            }
            Err(e) => {
                self.failures += 1;
                Err(e)
            }
        }
    }

    fn on_result<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result
            && e.is_connection_error()
        {
            self.failures += 1;
            self.port.close();
        }
        result
    }
}

#[async_trait::async_trait]
impl UartLike for UartConnectionManager {
    fn port_name(&self) -> &str {
        self.port.port()
    }

    fn is_connected(&self) -> Option<bool> {
        Some(self.port.is_open())
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        let result = self.port.read_available(buf).await;
        self.on_result(result)
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let result = self.port.write_frame(frame).await;
        self.on_result(result)
    }
}

/// Render bytes as `7E.7E.2F (3)`
pub fn format_hex_pretty(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3 + 8);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        let _ = write!(out, "{:02X}", b);
    }
    let _ = write!(out, " ({})", bytes.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex_pretty() {
        assert_eq!(format_hex_pretty(&[0x7E, 0x7E, 0x2F]), "7E.7E.2F (3)");
        assert_eq!(format_hex_pretty(&[]), " (0)");
    }

    #[test]
    fn test_line_settings() {
        let config = UartConfig::default();
        let settings = LineSettings::from_config(&config).unwrap();
        assert_eq!(settings.baud_rate, 4800);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::One);

        let bad = UartConfig {
            parity: "space".to_string(),
            ..UartConfig::default()
        };
        assert!(LineSettings::from_config(&bad).is_err());
    }

    #[test]
    fn test_port_starts_closed() {
        let port = UartPort::new(&UartConfig::default(), Duration::from_millis(10)).unwrap();
        assert!(!port.is_open());
        assert_eq!(port.port(), "/dev/ttyS1");
    }

    #[tokio::test]
    async fn test_missing_device_reports_uart_error_and_throttles() {
        let config = UartConfig {
            port: "/dev/acbridge-does-not-exist".to_string(),
            ..UartConfig::default()
        };
        let mut manager =
            UartConnectionManager::new(&config, Duration::from_millis(10), Duration::from_secs(60))
                .unwrap();
        let mut buf = [0u8; 8];
        let first = manager.read_available(&mut buf).await.unwrap_err();
        assert!(first.is_connection_error());
        assert_eq!(manager.failures(), 1);

        // second attempt inside the reconnect delay does not retry the open
        let second = manager.read_available(&mut buf).await.unwrap_err();
        assert!(second.to_string().contains("waiting to reopen"));
        assert_eq!(manager.failures(), 1);
        assert_eq!(manager.is_connected(), Some(false));
    }
}
