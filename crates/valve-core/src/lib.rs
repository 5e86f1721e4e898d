//! # valve-core
//!
//! Valve addressing and serial framing for the valve table: a large tiled
//! game board whose cells are opened and closed by solenoid valves.
//!
//! Every valve is driven by one output of an 8-bit shift register board.  The
//! boards are daisy-chained on a single data line that a microcontroller
//! shifts out on request.  This crate turns "open the valve at board cell
//! (x, y)" into the exact bytes that microcontroller expects on its serial
//! link.
//!
//! It has zero dependencies on OS APIs or device handles: the link to the
//! microcontroller is abstracted behind the [`link::Transport`] trait so the
//! hosting application decides whether that is a serial device node, a TCP
//! serial bridge, or an in-memory recorder in tests.
//!
//! # Architecture overview
//!
//! - **`domain`** – Pure addressing logic.  A [`Coordinate`] names a board
//!   cell; a [`RegisterBoard`] owns eight of them, one per output pin; a
//!   [`BoardChain`] routes any coordinate to the board that owns it and
//!   packs all boards into bytes in shift order.  The compiled-in layout of
//!   the physical table lives in [`domain::layout`].
//!
//! - **`protocol`** – How bytes travel over the serial link.  Each frame is a
//!   data-line selector plus the chain bytes, byte-stuffed with COBS and
//!   terminated by a `0x00` delimiter.
//!
//! - **`link`** – [`TableLink`], which owns a chain and a transport and
//!   re-transmits the full chain state after every mutation.

pub mod domain;
pub mod link;
pub mod protocol;

pub use domain::board::{Mirror, RegisterBoard, PINS_PER_BOARD};
pub use domain::chain::BoardChain;
pub use domain::coordinate::Coordinate;
pub use domain::error::{AddressError, LayoutError};
pub use domain::layout::{BoardSpec, TABLE_LAYOUT};
pub use link::{LinkError, LinkState, TableLink, Transport};
pub use protocol::{DecodedFrame, FrameDecoder, ProtocolError};
