//! Display mode selection and the appearance applied to each frame.

use log::info;

use crate::{
    clock::LocalDateTime,
    command::Rgb,
    outbox::PublishOutbox,
    pomodoro::PomodoroEngine,
    render::{Appearance, Frame, Rendered},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayMode {
    None,
    Clock,
    Pomodoro,
}

impl DisplayMode {
    /// Decodes the integer carried on `display/mode`.
    pub const fn from_wire(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::None),
            0 => Some(Self::Clock),
            1 => Some(Self::Pomodoro),
            _ => None,
        }
    }

    pub const fn wire(self) -> i8 {
        match self {
            Self::None => -1,
            Self::Clock => 0,
            Self::Pomodoro => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Clock => "clock",
            Self::Pomodoro => "pomodoro",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisplaySettings {
    pub mode: DisplayMode,
    pub color: Rgb,
    pub color565: u16,
    pub brightness: u8,
}

impl DisplaySettings {
    pub const fn new(mode: DisplayMode, color: Rgb, brightness: u8) -> Self {
        Self {
            mode,
            color,
            color565: color.to_rgb565(),
            brightness,
        }
    }

    pub const fn appearance(&self) -> Appearance {
        Appearance {
            color: self.color,
            color565: self.color565,
            brightness: self.brightness,
        }
    }
}

/// Owns [`DisplaySettings`] and routes each tick to the active renderer.
#[derive(Debug)]
pub struct DisplayController {
    settings: DisplaySettings,
}

impl DisplayController {
    pub const fn new(settings: DisplaySettings) -> Self {
        Self { settings }
    }

    pub const fn settings(&self) -> DisplaySettings {
        self.settings
    }

    pub const fn mode(&self) -> DisplayMode {
        self.settings.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.settings.mode != mode {
            info!(
                "display: mode {} -> {}",
                self.settings.mode.as_str(),
                mode.as_str()
            );
        }
        self.settings.mode = mode;
    }

    /// Keeps the packed form in step with the 24-bit color.
    pub fn set_color(&mut self, color: Rgb) {
        self.settings.color = color;
        self.settings.color565 = color.to_rgb565();
        info!("display: color #{:06x}", color.to_rgb888());
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.settings.brightness = brightness;
        info!("display: brightness {}", brightness);
    }

    /// Produces this second's frame, or `None` when nothing should be drawn.
    pub fn tick<O: PublishOutbox>(
        &self,
        local_time: &LocalDateTime,
        pomodoro: &mut PomodoroEngine,
        outbox: &mut O,
    ) -> Option<Rendered> {
        let frame = match self.settings.mode {
            DisplayMode::None => return None,
            DisplayMode::Clock => local_time.clock_frame(),
            DisplayMode::Pomodoro => pomodoro.tick(outbox),
        };

        let appearance = match frame {
            Frame::Blink { .. } => Appearance::FLASH,
            _ => self.settings.appearance(),
        };

        Some(Rendered { frame, appearance })
    }
}
