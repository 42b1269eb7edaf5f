//! Emulator side of mamele
//!
//! This crate provides:
//! - `EmulatorSession`: reports capabilities and frames to the driver and
//!   applies the button states it sends back
//! - `FrameHook`: the interface an emulator host calls every frame
//! - `PassthroughHook`: a blocking `FrameHook` for hosts with their own loop

pub mod session;
#[cfg(unix)]
pub mod hook;

pub use session::{EmulatorSession, FrameAdvance};
#[cfg(unix)]
pub use hook::{FrameHook, PassthroughHook};
