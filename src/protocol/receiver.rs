//! Byte-stream to frame assembly
//!
//! All supported units open a frame with `0x7E` sync bytes but differ in how
//! the frame length is known. [`FrameReceiver`] runs one state machine for
//! the three framings and hands complete frames (sync bytes included) to the
//! protocol decoders.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Frame sync byte
pub const SYNC_BYTE: u8 = 0x7E;

/// Largest frame the receiver buffers before resetting
pub const MAX_FRAME_LEN: usize = 200;

/// Bytes needed before a command-sized frame reveals its length
const COMMAND_SIZED_MIN_LEN: usize = 5;

/// How frame boundaries are determined
#[derive(Debug, Clone, Copy)]
pub enum Framing {
    /// `7E 7E LEN ...`: LEN counts the bytes after itself.
    LengthPrefixed,
    /// `7E 7E` followed by a body of fixed size.
    Fixed(usize),
    /// Single `7E`; the command byte at offset 2 maps to the total length.
    CommandSized(fn(u8) -> Option<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    WaitSync,
    Receive,
    Complete,
    Restart,
}

/// Counters kept across frames
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    pub frames: u64,
    pub discarded_bytes: u64,
    pub timeouts: u64,
    pub overflows: u64,
    pub unknown_commands: u64,
}

#[derive(Debug)]
pub struct FrameReceiver {
    framing: Framing,
    state: ReceiverState,
    buf: Vec<u8>,
    expected: Option<usize>,
    last_byte: Option<Instant>,
    read_timeout: Duration,
    stats: ReceiverStats,
}

impl FrameReceiver {
    pub fn new(framing: Framing, read_timeout: Duration) -> Self {
        Self {
            framing,
            state: ReceiverState::WaitSync,
            buf: Vec::with_capacity(MAX_FRAME_LEN),
            expected: None,
            last_byte: None,
            read_timeout,
            stats: ReceiverStats::default(),
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Bytes of the frame currently being assembled
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Feed received bytes and return every frame they complete.
    ///
    /// A partial frame older than the read timeout is dropped before the new
    /// bytes are consumed.
    pub fn feed(&mut self, bytes: &[u8], now: Instant) -> Vec<Vec<u8>> {
        self.check_timeout(now);
        let mut frames = Vec::new();
        for &b in bytes {
            if let Some(frame) = self.push(b) {
                frames.push(frame);
            }
        }
        if !bytes.is_empty() {
            self.last_byte = Some(now);
        }
        frames
    }

    /// Drop a stale partial frame. Returns true when one was dropped.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        if self.buf.is_empty() {
            return false;
        }
        let Some(last) = self.last_byte else {
            return false;
        };
        if now.saturating_duration_since(last) <= self.read_timeout {
            return false;
        }
        debug!(
            "RX timeout, dropping {} buffered bytes in state {:?}",
            self.buf.len(),
            self.state
        );
        self.stats.timeouts += 1;
        self.stats.discarded_bytes += self.buf.len() as u64;
        self.restart();
        true
    }

    fn restart(&mut self) {
        self.buf.clear();
        self.expected = None;
        self.state = ReceiverState::Restart;
    }

    fn discard(&mut self, extra: usize) {
        self.stats.discarded_bytes += (self.buf.len() + extra) as u64;
        self.buf.clear();
        self.expected = None;
    }

    fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if matches!(
            self.state,
            ReceiverState::Complete | ReceiverState::Restart
        ) {
            self.buf.clear();
            self.expected = None;
            self.state = ReceiverState::WaitSync;
        }

        match self.state {
            ReceiverState::WaitSync => {
                self.sync(byte);
                None
            }
            ReceiverState::Receive => self.receive(byte),
            ReceiverState::Complete | ReceiverState::Restart => None,
        }
    }

    fn sync(&mut self, byte: u8) {
        match self.framing {
            Framing::LengthPrefixed => {
                if byte == SYNC_BYTE {
                    // Extra sync bytes after the pair are idle line fill
                    if self.buf.len() < 2 {
                        self.buf.push(byte);
                    }
                } else if self.buf.len() == 2 {
                    let total = usize::from(byte) + 3;
                    if byte < 2 || total > MAX_FRAME_LEN {
                        self.stats.overflows += u64::from(byte >= 2);
                        self.discard(1);
                    } else {
                        self.buf.push(byte);
                        self.expected = Some(total);
                        self.state = ReceiverState::Receive;
                    }
                } else {
                    self.discard(1);
                }
            }
            Framing::Fixed(body) => {
                if self.buf.len() == 2 {
                    self.buf.push(byte);
                    self.expected = Some(body + 2);
                    self.state = ReceiverState::Receive;
                } else if byte == SYNC_BYTE {
                    self.buf.push(byte);
                } else {
                    self.discard(1);
                }
            }
            Framing::CommandSized(_) => {
                if byte == SYNC_BYTE {
                    self.buf.push(byte);
                    self.state = ReceiverState::Receive;
                } else {
                    self.stats.discarded_bytes += 1;
                }
            }
        }
    }

    fn receive(&mut self, byte: u8) -> Option<Vec<u8>> {
        self.buf.push(byte);

        if let Framing::CommandSized(length_of) = self.framing
            && self.expected.is_none()
            && self.buf.len() >= COMMAND_SIZED_MIN_LEN
        {
            let cmd = self.buf[2];
            match length_of(cmd) {
                Some(len) => self.expected = Some(len),
                None => {
                    warn!("Unknown command: 0x{:02X}", cmd);
                    self.stats.unknown_commands += 1;
                    self.discard(0);
                    self.state = ReceiverState::Restart;
                    return None;
                }
            }
        }

        if self.buf.len() >= MAX_FRAME_LEN {
            warn!("RX buffer overflow, dropping {} bytes", self.buf.len());
            self.stats.overflows += 1;
            self.discard(0);
            self.state = ReceiverState::Restart;
            return None;
        }

        match self.expected {
            Some(len) if self.buf.len() >= len => {
                self.state = ReceiverState::Complete;
                self.expected = None;
                self.stats.frames += 1;
                Some(std::mem::take(&mut self.buf))
            }
            _ => None,
        }
    }
}
