//! Raw video frames

use crate::screen::ScreenSize;

/// Pixel layouts that cross the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// As produced by the emulator: blue, green, red, alpha
    Bgra8,
    /// As handed to agents
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Reorder a BGRA buffer into packed RGB, dropping alpha
pub fn bgra_to_rgb(bgra: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(bgra.len() / 4 * 3);
    for pixel in bgra.chunks_exact(PixelFormat::Bgra8.bytes_per_pixel()) {
        rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }
    rgb
}

/// The most recent frame received from the emulator
#[derive(Debug, Clone)]
pub struct Frame {
    size: ScreenSize,
    bgra: Vec<u8>,
}

impl Frame {
    /// A black frame
    pub fn blank(size: ScreenSize) -> Self {
        Self {
            size,
            bgra: vec![0; size.frame_len()],
        }
    }

    pub fn new(size: ScreenSize, bgra: Vec<u8>) -> Self {
        debug_assert_eq!(bgra.len(), size.frame_len());
        Self { size, bgra }
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    /// Raw bytes, 4 per pixel in emulator order
    pub fn bgra(&self) -> &[u8] {
        &self.bgra
    }

    /// Packed RGB, row-major, 3 bytes per pixel
    pub fn to_rgb(&self) -> Vec<u8> {
        bgra_to_rgb(&self.bgra)
    }
}
