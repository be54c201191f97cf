//! Typed commands produced by the router.

use crate::display::DisplayMode;

/// 24-bit color as received over the bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Splits a `0xRRGGBB` value; `None` when it does not fit 24 bits.
    pub const fn from_rgb888(value: u32) -> Option<Self> {
        if value > 0x00FF_FFFF {
            return None;
        }

        Some(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }

    pub const fn to_rgb888(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Packed 5-6-5 pixel value used by the panel framebuffer.
    pub const fn to_rgb565(self) -> u16 {
        (((self.r as u16) & 0xF8) << 8) | (((self.g as u16) & 0xFC) << 3) | ((self.b as u16) >> 3)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PomodoroPhase {
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    SetMode(DisplayMode),
    SetColor(Rgb),
    SetBrightness(u8),
    SetPomodoroDuration { phase: PomodoroPhase, minutes: u8 },
    ResetPomodoro,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb888_split_and_join() {
        let color = Rgb::from_rgb888(0x12_34_56).unwrap();

        assert_eq!(color, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(color.to_rgb888(), 0x12_34_56);
        assert_eq!(Rgb::from_rgb888(0x0100_0000), None);
    }

    #[test]
    fn rgb565_packing_keeps_high_bits() {
        assert_eq!(Rgb::WHITE.to_rgb565(), 0xFFFF);
        assert_eq!(Rgb::new(0xFF, 0, 0).to_rgb565(), 0xF800);
        assert_eq!(Rgb::new(0, 0xFF, 0).to_rgb565(), 0x07E0);
        assert_eq!(Rgb::new(0, 0, 0xFF).to_rgb565(), 0x001F);
        assert_eq!(Rgb::new(0x07, 0x03, 0x07).to_rgb565(), 0x0000);
    }
}
