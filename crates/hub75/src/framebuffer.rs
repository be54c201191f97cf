//! In-memory RGB565 framebuffer for the matrix.

use core::convert::TryFrom;

use crate::protocol::{HEIGHT, SCAN_ROWS, WIDTH};

/// Total pixel count.
pub const PIXELS: usize = WIDTH * HEIGHT;

/// Row-major RGB565 framebuffer, origin top-left.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: [u16; PIXELS],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Creates a dark framebuffer.
    pub const fn new() -> Self {
        Self {
            pixels: [0u16; PIXELS],
        }
    }

    pub fn pixels(&self) -> &[u16; PIXELS] {
        &self.pixels
    }

    /// Fills every pixel with `color`.
    pub fn clear(&mut self, color: u16) {
        self.pixels.fill(color);
    }

    /// Sets a pixel color.
    ///
    /// Returns `true` when pixel is in bounds, `false` otherwise.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u16) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }

        self.pixels[y * WIDTH + x] = color;
        true
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }

        Some(self.pixels[y * WIDTH + x])
    }

    pub fn row(&self, y: usize) -> Option<&[u16; WIDTH]> {
        if y >= HEIGHT {
            return None;
        }

        let start = y * WIDTH;
        <&[u16; WIDTH]>::try_from(&self.pixels[start..start + WIDTH]).ok()
    }

    /// Upper and lower rows shifted out together for scan row 0..16.
    pub fn row_pair(&self, scan_row: usize) -> Option<(&[u16; WIDTH], &[u16; WIDTH])> {
        if scan_row >= SCAN_ROWS {
            return None;
        }

        Some((self.row(scan_row)?, self.row(scan_row + SCAN_ROWS)?))
    }
}
