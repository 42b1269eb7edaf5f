//! Agent side of mamele
//!
//! This crate provides:
//! - A session that launches an emulator, handshakes with it and plays
//! - The timed coin-and-start sequence that restarts a game
//! - The `ArcadeEnvironment` trait agents are written against

pub mod config;
pub mod environment;
pub mod launcher;
pub mod session;

pub use config::{DriverConfig, ResetTiming};
pub use environment::ArcadeEnvironment;
pub use launcher::{EmulatorLauncher, MameLauncher, default_rom_path};
pub use session::DriverSession;
