//! Wire-level helpers for 64x32 HUB75 RGB matrices (1/16 scan).

/// Panel width in pixels.
pub const WIDTH: usize = 64;
/// Panel height in pixels.
pub const HEIGHT: usize = 32;
/// Rows driven at once: row `r` and row `r + SCAN_ROWS` share an address.
pub const SCAN_ROWS: usize = HEIGHT / 2;
/// Address lines `A`..`D`.
pub const ADDRESS_LINES: usize = 4;
/// Most bit planes a 5-bit channel can provide.
pub const MAX_BIT_PLANES: u8 = 5;

/// Data pin levels for one column of one bit plane.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ColorBits {
    pub r: bool,
    pub g: bool,
    pub b: bool,
}

/// Levels for address lines `[A, B, C, D]` selecting scan row 0..16.
///
/// Returns `None` for rows outside the scan range.
#[inline]
pub fn address_levels(row: usize) -> Option<[bool; ADDRESS_LINES]> {
    if row >= SCAN_ROWS {
        return None;
    }

    let mut levels = [false; ADDRESS_LINES];
    for (bit, level) in levels.iter_mut().enumerate() {
        *level = (row >> bit) & 1 == 1;
    }
    Some(levels)
}

/// Splits an RGB565 pixel into its 5/6/5-bit channels.
#[inline]
pub const fn split_rgb565(pixel: u16) -> (u8, u8, u8) {
    (
        ((pixel >> 11) & 0x1F) as u8,
        ((pixel >> 5) & 0x3F) as u8,
        (pixel & 0x1F) as u8,
    )
}

/// Channel bits shown during `plane` of `planes` (plane 0 is least significant).
///
/// Only the top `planes` bits of each channel are used.
#[inline]
pub const fn plane_bits(pixel: u16, plane: u8, planes: u8) -> ColorBits {
    let (r, g, b) = split_rgb565(pixel);
    let shift5 = MAX_BIT_PLANES - planes + plane;
    let shift6 = shift5 + 1;

    ColorBits {
        r: (r >> shift5) & 1 == 1,
        g: (g >> shift6) & 1 == 1,
        b: (b >> shift5) & 1 == 1,
    }
}

/// Output-enable on-time for one plane, scaled by global brightness.
///
/// Each plane doubles the weight of the one below it.
#[inline]
pub const fn on_time_ns(base_ns: u32, plane: u8, brightness: u8) -> u32 {
    let weighted = (base_ns as u64) << plane;
    (weighted * brightness as u64 / u8::MAX as u64) as u32
}
