//! Storage infrastructure: configuration file persistence.
//!
//! Only host settings live on disk.  The board layout is compiled in and is
//! never read from or written to a file.

pub mod config;
