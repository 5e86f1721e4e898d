//! Infrastructure layer: configuration files and the physical link.

pub mod storage;
pub mod transport;
