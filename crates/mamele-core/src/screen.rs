//! Session capabilities negotiated at startup

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MameleError, Result};
use crate::frame::PixelFormat;
use crate::switch::SwitchStates;

/// Screen dimensions in pixels, sent as `<width>x<height>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one raw BGRA frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * PixelFormat::Bgra8.bytes_per_pixel()
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ScreenSize {
    type Err = MameleError;

    fn from_str(description: &str) -> Result<Self> {
        let parts: Vec<&str> = description.split('x').collect();
        if parts.len() != 2 {
            return Err(MameleError::ProtocolError(format!(
                "Expected a size in <width>x<height> format, got '{}'",
                description
            )));
        }

        let dimension = |part: &str| {
            part.parse::<u32>()
                .ok()
                .filter(|&value| value > 0)
                .ok_or_else(|| {
                    MameleError::ProtocolError(format!(
                        "Screen dimensions must be positive integers, got '{}'",
                        description
                    ))
                })
        };

        Ok(Self {
            width: dimension(parts[0])?,
            height: dimension(parts[1])?,
        })
    }
}

/// Screen size plus the switches this game uses. Fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub screen: ScreenSize,
    pub used: SwitchStates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        let size: ScreenSize = "320x240".parse().unwrap();
        assert_eq!(size, ScreenSize::new(320, 240));
        assert_eq!(size.frame_len(), 307_200);
        assert_eq!(size.to_string(), "320x240");
    }

    #[test]
    fn test_parse_bad_sizes() {
        for bad in ["320", "320x240x1", "x240", "320xabc", "-3x4", "0x240", ""] {
            assert!(
                matches!(bad.parse::<ScreenSize>(), Err(MameleError::ProtocolError(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }
}
