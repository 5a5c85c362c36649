use crate::error::{AcBridgeError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Byte transport a climate driver talks through
#[async_trait::async_trait]
pub trait UartLike: Send {
    fn port_name(&self) -> &str;

    /// Optional connection status. Default: unknown (None).
    fn is_connected(&self) -> Option<bool> {
        None
    }

    /// Read pending bytes; 0 when nothing arrived
    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryLine {
    rx: VecDeque<u8>,
    tx: Vec<Vec<u8>>,
    fail_writes: bool,
}

/// In-memory transport; the paired [`MemoryUartHandle`] plays the unit
#[derive(Debug, Clone, Default)]
pub struct MemoryUart {
    line: Arc<Mutex<MemoryLine>>,
}

/// Unit side of a [`MemoryUart`]
#[derive(Debug, Clone)]
pub struct MemoryUartHandle {
    line: Arc<Mutex<MemoryLine>>,
}

impl MemoryUart {
    pub fn new() -> (Self, MemoryUartHandle) {
        let uart = Self::default();
        let handle = MemoryUartHandle {
            line: uart.line.clone(),
        };
        (uart, handle)
    }
}

impl MemoryUartHandle {
    /// Queue bytes for the driver to read
    pub fn push_rx(&self, bytes: &[u8]) {
        if let Ok(mut line) = self.line.lock() {
            line.rx.extend(bytes);
        }
    }

    /// Bytes queued by `push_rx` that the driver has not read yet
    pub fn unread(&self) -> usize {
        self.line.lock().map(|l| l.rx.len()).unwrap_or_default()
    }

    /// Frames written by the driver so far
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.line.lock().map(|l| l.tx.clone()).unwrap_or_default()
    }

    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut line) = self.line.lock() {
            line.fail_writes = fail;
        }
    }
}

#[async_trait::async_trait]
impl UartLike for MemoryUart {
    fn port_name(&self) -> &str {
        "memory"
    }

    fn is_connected(&self) -> Option<bool> {
        Some(true)
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut line = self
            .line
            .lock()
            .map_err(|_| AcBridgeError::uart("memory line poisoned"))?;
        let n = buf.len().min(line.rx.len());
        for (slot, byte) in buf.iter_mut().zip(line.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut line = self
            .line
            .lock()
            .map_err(|_| AcBridgeError::uart("memory line poisoned"))?;
        if line.fail_writes {
            return Err(AcBridgeError::uart("write failed"));
        }
        line.tx.push(frame.to_vec());
        Ok(())
    }
}
