//! Application layer: how the rest of the system issues valve commands.
//!
//! A [`valve_core::TableLink`] must have exactly one mutator.  The vision
//! loop, the game engine, and the diagnostics procedures all want to drive
//! valves, so they talk to a single worker thread through a cloneable
//! [`valve_worker::ValveHandle`] instead of sharing the link.

pub mod diagnostics;
pub mod valve_worker;
