//! Shared bridge infrastructure for mamele
//!
//! This crate provides:
//! - A framed connection with exact-length and delimiter-terminated reads
//! - The message vocabulary exchanged by driver and emulator
//! - The Unix socket rendezvous used to connect the two processes

pub mod connection;
pub mod protocol;
pub mod rendezvous;
#[cfg(unix)]
pub mod unix;

pub use connection::Connection;
pub use protocol::{DriverCommand, EmulatorMessage, Tag, Update};
pub use rendezvous::Rendezvous;
#[cfg(unix)]
pub use unix::{Listener, connect, listen};
