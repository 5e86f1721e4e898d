//! The link to the valve table's microcontroller.
//!
//! [`TableLink`] owns one [`BoardChain`] and one [`Transport`].  Every
//! mutation is followed by a full-state frame, so the hardware converges on
//! the in-memory state at the next successful write even if earlier frames
//! were lost.
//!
//! # Lifecycle
//!
//! ```text
//! open ──(reset frame)──▶ Ready ──{set, fill, clear, send}*──▶ Ready
//!                           │
//!                           └──(close | transport error)──▶ Closed
//! ```
//!
//! A link has exactly one mutator.  Hosts with several producers must
//! serialize access themselves, for example through a single-writer queue.

use std::io;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::chain::BoardChain;
use crate::domain::coordinate::Coordinate;
use crate::domain::error::{AddressError, LayoutError};
use crate::domain::layout::BoardSpec;
use crate::protocol::frame::{reset_frame, state_frame, RESET_SELECTOR};

pub mod memory;
pub mod stream;

pub use memory::MemoryTransport;
pub use stream::StreamTransport;

/// A reliable, blocking, byte-oriented channel to the microcontroller.
///
/// Writes have no timeout: a stalled link blocks the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Writes one complete frame, delimiter included.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Releases the underlying channel.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write_frame(frame)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Errors returned by [`TableLink`] operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The static layout or data line is invalid.
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    /// The request referenced a coordinate or board outside the chain.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Writing to the transport failed.  The link is now closed.
    #[error("transport write failed: {0}")]
    Transport(#[source] io::Error),

    /// The link was already closed.
    #[error("link is closed")]
    Closed,
}

/// Whether a [`TableLink`] still accepts operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Ready,
    Closed,
}

/// An open link to the table: chain state plus the transport it is sent on.
#[derive(Debug)]
pub struct TableLink<T: Transport> {
    chain: BoardChain,
    transport: T,
    data_line: u8,
    state: LinkState,
    frames_sent: u64,
}

impl<T: Transport> TableLink<T> {
    /// Builds the chain described by `layout` and opens a link over
    /// `transport`, sending the reset frame before returning.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Layout`] for a malformed layout or a data line
    /// equal to the reset selector, and [`LinkError::Transport`] if the reset
    /// frame cannot be written.
    pub fn open(transport: T, layout: &[BoardSpec], data_line: u8) -> Result<Self, LinkError> {
        let chain = BoardChain::from_specs(layout)?;
        Self::with_chain(transport, chain, data_line)
    }

    /// Opens a link over an already built chain.  See [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open), minus layout construction errors.
    pub fn with_chain(transport: T, chain: BoardChain, data_line: u8) -> Result<Self, LinkError> {
        if data_line == RESET_SELECTOR {
            return Err(LayoutError::ReservedDataLine(data_line).into());
        }

        let mut link = Self {
            chain,
            transport,
            data_line,
            state: LinkState::Ready,
            frames_sent: 0,
        };
        link.write(&reset_frame())?;
        info!(
            data_line,
            boards = link.chain.len(),
            "table link open, reset frame sent"
        );
        Ok(link)
    }

    /// Sets one valve and re-transmits the full state.
    ///
    /// An unmapped coordinate changes nothing and sends nothing.
    ///
    /// # Errors
    ///
    /// [`LinkError::Address`] for an unmapped coordinate,
    /// [`LinkError::Transport`] if the write fails, [`LinkError::Closed`] if
    /// the link is closed.
    pub fn set(&mut self, coordinate: Coordinate, value: bool) -> Result<(), LinkError> {
        self.ensure_ready()?;
        self.chain.set(coordinate, value)?;
        self.send()
    }

    /// Sets several valves in order and transmits once.
    ///
    /// If an unmapped coordinate is reached, the coordinates before it stay
    /// applied and are still transmitted before the error is returned.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).  A transport error takes precedence over
    /// the address error.
    pub fn set_many<I>(&mut self, coordinates: I, value: bool) -> Result<(), LinkError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        self.ensure_ready()?;
        let applied = self.chain.set_many(coordinates, value);
        self.send()?;
        applied.map_err(LinkError::from)
    }

    /// Opens or closes every valve of the board at chain `index`, then
    /// re-transmits.
    ///
    /// # Errors
    ///
    /// [`LinkError::Address`] if there is no such board, otherwise as for
    /// [`send`](Self::send).
    pub fn set_board(&mut self, index: usize, value: bool) -> Result<(), LinkError> {
        self.ensure_ready()?;
        let board = self.chain.board_mut(index)?;
        if value {
            board.fill();
        } else {
            board.clear();
        }
        self.send()
    }

    /// Opens every valve and re-transmits.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn fill(&mut self) -> Result<(), LinkError> {
        self.ensure_ready()?;
        self.chain.fill();
        self.send()
    }

    /// Closes every valve and re-transmits.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn clear(&mut self) -> Result<(), LinkError> {
        self.ensure_ready()?;
        self.chain.clear();
        self.send()
    }

    /// Re-transmits the current state without changing it.
    ///
    /// # Errors
    ///
    /// [`LinkError::Transport`] if the write fails (the link is then closed),
    /// [`LinkError::Closed`] if it already was.
    pub fn send(&mut self) -> Result<(), LinkError> {
        self.ensure_ready()?;
        let frame = state_frame(self.data_line, &self.chain);
        self.write(&frame)
    }

    /// Closes the transport.  Further operations fail with
    /// [`LinkError::Closed`].  Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`LinkError::Transport`] if the transport fails to close; the link is
    /// closed regardless.
    pub fn close(&mut self) -> Result<(), LinkError> {
        if self.state == LinkState::Closed {
            return Ok(());
        }
        self.state = LinkState::Closed;
        info!(frames_sent = self.frames_sent, "table link closed");
        self.transport.close().map_err(LinkError::Transport)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The chain as last mutated.  After a transport error this may be
    /// ahead of what the hardware shows.
    pub fn chain(&self) -> &BoardChain {
        &self.chain
    }

    /// Data line selector used for state frames.
    pub fn data_line(&self) -> u8 {
        self.data_line
    }

    /// Frames written successfully, reset frame included.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn ensure_ready(&self) -> Result<(), LinkError> {
        match self.state {
            LinkState::Ready => Ok(()),
            LinkState::Closed => Err(LinkError::Closed),
        }
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        if let Err(e) = self.transport.write_frame(frame) {
            error!("transport write failed, closing link: {e}");
            self.state = LinkState::Closed;
            return Err(LinkError::Transport(e));
        }
        self.frames_sent += 1;
        debug!(len = frame.len(), seq = self.frames_sent, "frame sent");
        Ok(())
    }
}
