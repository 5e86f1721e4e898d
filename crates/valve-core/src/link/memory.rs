//! In-memory transport for tests and dry runs.
//!
//! Records every byte written so tests can inspect the exact wire output
//! after the transport has been moved into a [`TableLink`](super::TableLink).

use std::io;
use std::sync::{Arc, Mutex};

use super::Transport;
use crate::protocol::frame::{decode_frame, DecodedFrame};

#[derive(Debug, Default)]
struct Shared {
    written: Vec<u8>,
    failing: bool,
    closed: bool,
}

/// A [`Transport`] that appends frames to a shared buffer.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    /// Creates an empty, working transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail with `BrokenPipe` (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Returns a copy of everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Returns and clears everything written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().written)
    }

    /// Decodes everything written so far into frames.  Stops at the first
    /// undecodable frame.
    pub fn frames(&self) -> Vec<DecodedFrame> {
        let written = self.written();
        let mut frames = Vec::new();
        let mut rest = &written[..];
        while let Ok((frame, consumed)) = decode_frame(rest) {
            frames.push(frame);
            rest = &rest[consumed..];
        }
        frames
    }

    /// Whether [`Transport::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        // A poisoned lock only means a test thread panicked mid-write; the
        // buffer is still usable.
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut shared = self.lock();
        if shared.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed"));
        }
        if shared.failing {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated link failure"));
        }
        shared.written.extend_from_slice(frame);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}
