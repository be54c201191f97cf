//! View models handed from the core to the board renderer.

use heapless::String;

use crate::command::Rgb;

pub const DATE_BYTES: usize = 10;
pub const TIME_BYTES: usize = 8;
pub const COUNTDOWN_BYTES: usize = 8;

/// Output settings applied to the panel right before a frame is drawn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Appearance {
    pub color: Rgb,
    /// Packed 5-6-5 form of `color`.
    pub color565: u16,
    pub brightness: u8,
}

impl Appearance {
    /// Blink frames ignore the user settings.
    pub const FLASH: Self = Self {
        color: Rgb::WHITE,
        color565: 0xFFFF,
        brightness: u8::MAX,
    };
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    Clock {
        weekday: &'static str,
        date: String<DATE_BYTES>,
        time: String<TIME_BYTES>,
    },
    Pomodoro {
        label: &'static str,
        countdown: String<COUNTDOWN_BYTES>,
    },
    Blink {
        lit: bool,
    },
}

/// A frame together with how to show it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendered {
    pub frame: Frame,
    pub appearance: Appearance,
}
