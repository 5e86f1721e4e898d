//! Domain entities for valve addressing.
//!
//! This module contains pure addressing logic with no I/O.  It answers two
//! questions:
//!
//! - Which shift register output drives the valve at a given board cell?
//! - What bytes must be shifted into the daisy chain so that exactly the
//!   requested valves are open?
//!
//! The chain layout is built once from a static table and never restructured
//! afterwards, so every lookup is a plain map access into an index built at
//! construction time.

pub mod board;
pub mod chain;
pub mod coordinate;
pub mod error;

/// The compiled-in physical layout of the table.
///
/// See [`layout::TABLE_LAYOUT`].
pub mod layout;
