//! # mamele-core
//!
//! Core types for the mamele control protocol.
//!
//! This crate provides the types both ends of the protocol agree on:
//! - The twelve switches and their wire bitstring
//! - The emulator-side button bank
//! - Screen size and session capabilities
//! - Action spaces and the action to switch-state table
//! - Raw frame conversion

pub mod action;
pub mod buttons;
pub mod error;
pub mod frame;
pub mod screen;
pub mod switch;

pub use action::{Action, ActionGroup, ActionSpace, ActionTable, Choice};
pub use buttons::{Button, ButtonBank};
pub use error::{MameleError, Result};
pub use frame::{Frame, PixelFormat, bgra_to_rgb};
pub use screen::{Capabilities, ScreenSize};
pub use switch::{IntoSwitch, Switch, SwitchStates};
